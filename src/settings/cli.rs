use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Bearer token issuing and revocation service")]
pub struct Cli {
    /// Path of the settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
