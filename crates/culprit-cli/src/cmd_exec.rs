use culprit_facade::Facade;
use std::path::Path;

pub fn execute(repo_root: &Path, command: &str) -> anyhow::Result<()> {
    if command.trim().is_empty() {
        anyhow::bail!("usage: culprit exec -- <command text>");
    }
    let mut facade = Facade::open(repo_root)?;
    let outcome = facade.parse(command);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
