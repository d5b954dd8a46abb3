use std::path::PathBuf;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::settings::{absolute_path, load_settings, save_settings, settings_path, shellexpand_path};
use crate::source::export_url;

pub fn run(data_file: Option<String>, source_url: Option<String>, name: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(file) = data_file {
        settings.data_file = absolute_path(&file)?;
    }
    if let Some(url) = source_url {
        let url = url.trim();
        settings.source_url = if url.is_empty() {
            None
        } else {
            Some(export_url(url))
        };
    }
    if let Some(name) = name {
        settings.user_name = name.trim().to_string();
    }

    save_settings(&settings)?;

    let path = PathBuf::from(shellexpand_path(&settings.data_file));
    if path.exists() {
        println!("Using existing ledger at {}", path.display());
    } else {
        Ledger::empty().save(&path)?;
        println!("Created ledger at {}", path.display());
    }
    if let Some(url) = &settings.source_url {
        println!("Reading from {url} (read-only)");
    }
    println!("Settings saved to {}", settings_path().display());
    Ok(())
}
