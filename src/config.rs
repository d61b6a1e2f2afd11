use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::data::filter::FilterCriteria;
use crate::data::model::{Dataset, Dimension};

/// File opened at startup when none is given and it exists in the working directory.
pub const DEFAULT_DATA_FILE: &str = "1000-Registros-de-ventas.xlsx";

#[derive(Parser, Debug, Clone)]
#[command(name = "sales-dashboard")]
#[command(version, about = "Interactive sales dashboard", long_about = None)]
pub struct Config {
    /// Sales file to open (.xlsx, .xls, .ods, .csv, .parquet, .json)
    pub file: Option<PathBuf>,

    /// Number of countries in the top-countries chart
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Print the dashboard summary as JSON and exit
    #[arg(long)]
    pub summary: bool,

    /// Write the filtered rows as CSV to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Keep only these zones (repeatable)
    #[arg(long = "zone", value_name = "ZONE")]
    pub zones: Vec<String>,

    /// Keep only these product types (repeatable)
    #[arg(long = "product-type", value_name = "TYPE")]
    pub product_types: Vec<String>,

    /// Keep only these sales channels (repeatable)
    #[arg(long = "channel", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// Keep only these countries (repeatable)
    #[arg(long = "country", value_name = "COUNTRY")]
    pub countries: Vec<String>,

    /// First order date to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last order date to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl Config {
    /// Summary or export requested: run without opening a window.
    pub fn is_headless(&self) -> bool {
        self.summary || self.export.is_some()
    }

    /// The explicit file, or [`DEFAULT_DATA_FILE`] if it is present.
    pub fn startup_file(&self) -> Option<PathBuf> {
        self.file.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_DATA_FILE);
            default.exists().then_some(default)
        })
    }

    /// Build the filter criteria given on the command line.
    ///
    /// An open end of the date range falls back to the dataset's own bound.
    pub fn criteria(&self, dataset: &Dataset) -> FilterCriteria {
        let mut criteria = FilterCriteria::for_dataset(dataset);
        let selections = [
            (Dimension::Zone, &self.zones),
            (Dimension::ProductType, &self.product_types),
            (Dimension::Channel, &self.channels),
            (Dimension::Country, &self.countries),
        ];
        for (dim, values) in selections {
            criteria.set(dim, values.iter().cloned());
        }

        if self.from.is_some() || self.to.is_some() {
            let bounds = dataset.date_bounds();
            let start = self
                .from
                .or(bounds.map(|(lo, _)| lo))
                .unwrap_or(NaiveDate::MIN);
            let end = self.to.or(bounds.map(|(_, hi)| hi)).unwrap_or(NaiveDate::MAX);
            criteria.set_date_range(start, end);
        }
        criteria
    }
}
