use clap::Parser;
use gov_ease::cli::commands::{
    CommandContext, cmd_autofill, cmd_field_help, cmd_instructions, cmd_profile, cmd_scan,
    cmd_speak, cmd_summarize,
};
use gov_ease::cli::config::{Cli, Commands, load_config, log_level, resolve_profile_path};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve profile path: CLI > config > default
    let profile_path = resolve_profile_path(cli.profile.as_deref(), &config);
    let ctx = CommandContext {
        config,
        profile_path,
        mute: cli.mute,
    };

    match cli.command {
        Commands::Scan { snapshot, json } => cmd_scan(&ctx, &snapshot, json)?,
        Commands::Autofill {
            snapshot,
            form,
            output,
        } => cmd_autofill(&ctx, &snapshot, form, output.as_deref())?,
        Commands::Instructions { snapshot, form } => cmd_instructions(&ctx, &snapshot, form)?,
        Commands::FieldHelp { snapshot, form } => cmd_field_help(&ctx, &snapshot, form)?,
        Commands::Summarize {
            snapshot,
            api_key,
            save_key,
            timeout,
        } => cmd_summarize(&ctx, &snapshot, api_key.as_deref(), save_key, timeout)?,
        Commands::Speak {
            text,
            output,
            play,
            timeout,
        } => cmd_speak(&ctx, &text, output.as_deref(), play, timeout)?,
        Commands::Profile { action } => cmd_profile(&ctx, &action)?,
    }

    Ok(())
}
