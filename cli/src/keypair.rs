use crate::output::{print, Format};
use anyhow::{Context, Result};
use clap::Parser;

/// Generate a 2048 bit RSA key pair and print both halves.
#[derive(Debug, Parser)]
pub(crate) struct Keypair {
    /// Only print the OpenSSH public key.
    #[clap(long = "public-only")]
    public_only: bool,
}

impl Keypair {
    pub(crate) fn run(&self, format: Format) -> Result<()> {
        let keypair =
            infra_components::Keypair::generate().context("Unable to generate a key pair")?;
        if self.public_only {
            println!("{}", keypair.public);
            return Ok(());
        }
        print(&keypair, format)
    }
}
