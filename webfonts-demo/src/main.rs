//! webfonts demo — runs the engine over a small multilingual document.
//!
//! Usage: `webfonts-demo [repository.json] [document-language]`
//!
//! Without arguments the bundled repository and Hebrew are used. Prints
//! every inserted `@font-face` rule followed by the resulting
//! `font-family` of each element.

use log::{error, info};
use std::process::ExitCode;
use uuid::Uuid;

use webfonts_core::Repository;
use webfonts_engine::{DocumentError, MemoryDocument, WebFonts, WebFontsOptions};

fn build_document(language: &str) -> Result<(MemoryDocument, Vec<(&'static str, Uuid)>), DocumentError> {
    let mut doc = MemoryDocument::new();
    doc.set_document_language(language);
    let root = doc.root();
    let body = doc.append(root, "body", &[])?;

    let mut labelled = vec![("body", body)];
    labelled.push(("p[lang=ml]", doc.append(body, "p", &[("lang", "ml")])?));
    labelled.push(("p[lang=am]", doc.append(body, "p", &[("lang", "am")])?));
    labelled.push(("p[lang=en]", doc.append(body, "p", &[("lang", "en")])?));
    labelled.push((
        "p[style]",
        doc.append(body, "p", &[("style", "font-family: 'Alef', serif")])?,
    ));
    let form = doc.append(body, "form", &[])?;
    labelled.push(("textarea", doc.append(form, "textarea", &[])?));
    Ok((doc, labelled))
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let repository = match args.next() {
        Some(path) => match Repository::load(&path) {
            Ok(repository) => repository,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Repository::new(),
    };
    let language = args.next().unwrap_or_else(|| "he".to_string());

    let (mut doc, labelled) = match build_document(&language) {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to build demo document: {e}");
            return ExitCode::FAILURE;
        }
    };
    let body = labelled[0].1;

    let session = WebFonts::attach(&mut doc, body, WebFontsOptions::default().with_repository(repository));
    info!(
        "Attached to body (language {:?}), {} families loaded",
        session.language(),
        session.loaded_families().len()
    );

    for rule in doc.inserted_styles() {
        println!("{rule}\n");
    }
    for (label, id) in &labelled {
        let family = doc.font_family(*id).unwrap_or_else(|| "(inherited)".to_string());
        println!("{label:<12} {family}");
    }

    let loaded = session.detach();
    info!("Detached; loaded: {}", loaded.join(", "));
    ExitCode::SUCCESS
}
