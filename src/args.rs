use clap::Parser;

/// Replays the answers of the Fractal de Comportamento questionnaires and sends them to the collector.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the form and the sources of answers, in JSON format.
    /// For more information about the file format, read the manual of the fractal_form crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, fractal will check that the
    /// summary of the run matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the run will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A file of answers. Setting this option overrides the sources that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet is used otherwise.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (standard or behaviorFractal) The form to fill. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub variant: Option<String>,

    /// (URL) Where the finalized records are posted. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub collector_url: Option<String>,

    // Other arguments
    /// If passed as an argument, nothing is sent to the collector. The records are logged instead.
    #[clap(long, takes_value = false)]
    pub dry_run: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
