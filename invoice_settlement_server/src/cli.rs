use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // ISP_WALLET_DAEMON_TOKEN is deliberately absent
    const DISPLAY_ENVS: [&str; 21] = [
        "RUST_LOG",
        "ISP_HOST",
        "ISP_PORT",
        "ISP_DATABASE_URL",
        "ISP_EXCHANGE_ADDRESS",
        "ISP_STABLE_CURRENCY",
        "ISP_REFERENCE_CURRENCY",
        "ISP_POLL_INTERVAL_SECS",
        "ISP_TICK_BUDGET_SECS",
        "ISP_MONITOR_CONCURRENCY",
        "ISP_CLAIM_LEASE_SECS",
        "ISP_PRICE_LOCK_MINUTES",
        "ISP_MIN_CONFIRMATIONS",
        "ISP_REQUIRE_FULL_AMOUNT",
        "ISP_WALLET_DAEMON_URL",
        "ISP_FEE_RATE_MSAT_PER_BYTE",
        "ISP_PRICE_FEED_URL",
        "ISP_PRICE_FEED_ASSET_ID",
        "ISP_HTTP_TIMEOUT_SECS",
        "ISP_NOTIFICATION_WEBHOOK_URL",
        "ISP_DISABLE_MONITOR",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
