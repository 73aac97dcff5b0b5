fn main() -> anyhow::Result<()> {
    locpatcher::cli::run_cli()
}
