use clap::Parser;
use std::path::PathBuf;

/// The Nexus LLM gateway: a protocol-translating proxy in front of
/// OpenAI-chat, OpenAI-responses, and Anthropic-messages upstreams.
#[derive(Debug, Parser)]
#[command(name = "nexus", version, about)]
pub struct Args {
    /// Path to the TOML routing config. Without one, the gateway starts
    /// with a single demo model mapping so the binary is runnable out of
    /// the box.
    #[arg(long, short = 'c', env = "NEXUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides the listen address from the config file.
    #[arg(long, env = "NEXUS_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// `log` crate filter string, e.g. "info" or "gateway=debug,nexus=trace".
    #[arg(long, env = "NEXUS_LOG", default_value = "info")]
    pub log_filter: String,
}
