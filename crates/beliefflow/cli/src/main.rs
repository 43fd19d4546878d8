fn main() -> anyhow::Result<()> {
    beliefflow_cli::run()
}
