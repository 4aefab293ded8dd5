use anyhow::Result;

fn main() -> Result<()> {
    cinder_driver::main()
}
