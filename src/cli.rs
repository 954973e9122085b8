use anyhow::{anyhow, Context as _, Result};
use std::io::Write as _;
use std::path::Path;

use crate::args::Args;
use crate::config::{Config, ConfigOverrides};
use crate::convert::convert;
use crate::dicts;
use crate::export;
use crate::import;
use crate::model::HomebankModel;

pub fn main(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let output = run(&args.file, &config, args.print_config_dicts)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| anyhow!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::default();
    if let Some(path) = &args.config {
        config = config.with_overrides(ConfigOverrides::load(path)?);
    }
    let mut flags = ConfigOverrides::default();
    if args.keep_empty_categories {
        flags.remove_empty_categories = Some(false);
    }
    if args.keep_negative_amounts {
        flags.prefer_positive_amounts = Some(false);
    }
    let config = config.with_overrides(flags);
    config.validate().context("Invalid config")?;
    Ok(config)
}

/// Produces the complete output text. Nothing is written before the whole conversion succeeded.
fn run(file: &Path, config: &Config, print_config_dicts: bool) -> Result<String> {
    let document = import::load(file)?;
    let model = HomebankModel::load(&document, config)
        .with_context(|| anyhow!("Failed to load {}", file.display()))?;
    let directives = convert(&model, config);

    if print_config_dicts {
        // The rename tables are most useful when the conversion fails, so don't bail out here
        let directives = match &directives {
            Ok(directives) => Some(directives.as_slice()),
            Err(err) => {
                log::warn!(
                    "Failed to convert {}, ledger account names are derived from the Homebank records: {}",
                    file.display(),
                    err
                );
                None
            }
        };
        return dicts::config_skeleton(&model, directives, config).to_yaml();
    }

    let directives =
        directives.with_context(|| anyhow!("Failed to convert {}", file.display()))?;

    let mut output = vec![];
    export::render(&directives, &mut output).context("Failed to render ledger")?;
    Ok(String::from_utf8(output)?)
}
