fn main() -> anyhow::Result<()> {
    fluxstat_cli::run()
}
