use crate::config::CodeArgs;

pub fn run(code: &CodeArgs) -> eyre::Result<()> {
    println!("{}", code.secret()?.fingerprint());
    Ok(())
}
