use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::data::aggregate::DashboardSummary;
use crate::data::export::save_csv;
use crate::data::filter::apply_filters;
use crate::data::loader::load_file;

/// Load, filter, then print the summary and/or write the CSV export.
pub fn run(config: &Config) -> Result<()> {
    let Some(path) = config.startup_file() else {
        bail!("no input file given (and no default data file in the working directory)");
    };

    let dataset =
        load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    log::info!("Loaded {} records from {}", dataset.len(), path.display());

    let criteria = config.criteria(&dataset);
    let view = apply_filters(&dataset, &criteria);

    if config.summary {
        let summary = DashboardSummary::compute(&view, config.top_n);
        let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
        println!("{json}");
    }

    if let Some(out) = &config.export {
        let rows = save_csv(&view, out).with_context(|| format!("exporting to {}", out.display()))?;
        eprintln!("wrote {rows} rows to {}", out.display());
    }

    Ok(())
}
