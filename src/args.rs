use clap::Parser;
use std::path::PathBuf;

/// Convert a Homebank file to a beancount ledger
#[derive(Parser, Debug)]
#[clap(version)]
pub struct Args {
    /// Path to the Homebank .xhb file
    pub file: PathBuf,

    /// YAML config file with renames and conversion settings
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Write the ledger to this file instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Print a config file with rename tables for all names in the Homebank file instead of converting
    #[clap(short, long)]
    pub print_config_dicts: bool,

    /// Open accounts for categories that no operation uses
    #[clap(long)]
    pub keep_empty_categories: bool,

    /// Keep negative amounts on the first posting instead of swapping the postings
    #[clap(long)]
    pub keep_negative_amounts: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal() {
        let args = Args::try_parse_from(["beancount-import-homebank", "finances.xhb"]).unwrap();
        assert_eq!(PathBuf::from("finances.xhb"), args.file);
        assert_eq!(None, args.config);
        assert_eq!(None, args.output);
        assert!(!args.print_config_dicts);
        assert!(!args.keep_empty_categories);
        assert!(!args.keep_negative_amounts);
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "beancount-import-homebank",
            "-c",
            "config.yaml",
            "-o",
            "ledger.beancount",
            "-p",
            "--keep-empty-categories",
            "--keep-negative-amounts",
            "finances.xhb",
        ])
        .unwrap();
        assert_eq!(Some(PathBuf::from("config.yaml")), args.config);
        assert_eq!(Some(PathBuf::from("ledger.beancount")), args.output);
        assert!(args.print_config_dicts);
        assert!(args.keep_empty_categories);
        assert!(args.keep_negative_amounts);
    }

    #[test]
    fn file_is_required() {
        assert!(Args::try_parse_from(["beancount-import-homebank"]).is_err());
    }

    #[test]
    fn verify_command() {
        use clap::CommandFactory as _;
        Args::command().debug_assert();
    }
}
