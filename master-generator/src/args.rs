use clap::Parser;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
pub struct GeneratorArgs {
    #[arg(long, default_value = "xiv.starry.blue", env = "HOSTING_DOMAIN")]
    pub hosting_domain: String,

    #[arg(
        long,
        default_value = "true",
        env = "ENABLE_DOWNLOAD_COUNTER",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub enable_download_counter: bool,

    #[arg(short, long, default_value = "plugins", env = "PLUGINS_DIRECTORY")]
    pub plugins_directory: PathBuf,

    /// Where to write the catalog, defaults to `<plugins-directory>/master.json`.
    #[arg(short, long, env = "MASTER_OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Settings consumed by the merge, detached from how they were sourced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub hosting_domain: String,
    pub enable_download_counter: bool,
    pub plugins_directory: PathBuf,
    pub output: PathBuf,
}

impl From<GeneratorArgs> for GeneratorConfig {
    fn from(args: GeneratorArgs) -> Self {
        let output = args
            .output
            .unwrap_or_else(|| args.plugins_directory.join("master.json"));

        Self {
            hosting_domain: args.hosting_domain,
            enable_download_counter: args.enable_download_counter,
            plugins_directory: args.plugins_directory,
            output,
        }
    }
}
