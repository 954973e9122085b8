use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    let args = beancount_import_homebank::args::parse();
    beancount_import_homebank::cli::main(args)
}
