use anyhow::Result;
use log::info;

use crate::{
    cli::ConfigureArgs, config::LookupConfig, error::LookupError, store::Store,
    vocabulary::Vocabulary,
};

pub fn execute(args: &ConfigureArgs) -> Result<()> {
    let vocabulary = Vocabulary::load_or_builtin(args.vocabulary.as_deref())?;
    let store = Store::open(&args.store);
    let config = build_config(args, &store, &vocabulary)?;
    store.save_config(&config)?;
    info!(
        "Lookup configured: identity '{}', date '{}', {} visible column(s)",
        config.identity_column,
        config.date_column,
        config.visible_columns.len()
    );
    Ok(())
}

fn build_config(
    args: &ConfigureArgs,
    store: &Store,
    vocabulary: &Vocabulary,
) -> Result<LookupConfig> {
    if args.identity.trim().is_empty() || args.date.trim().is_empty() {
        return Err(LookupError::IncompleteConfig.into());
    }
    let available = store.available_columns()?;
    if available.is_empty() {
        return Err(LookupError::NoColumnsLoaded.into());
    }
    let visible: Vec<String> = if args.visible.is_empty() {
        vocabulary
            .visible_default()
            .iter()
            .filter(|column| available.contains(column))
            .cloned()
            .collect()
    } else {
        args.visible.clone()
    };
    let config = LookupConfig::new(&args.identity, &args.date, &visible)?;
    config.validate_against(&available)?;
    Ok(config)
}
