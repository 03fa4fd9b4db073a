use anyhow::Context;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

static LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} | {({l}):5.5} | {f}:{L} — {m}{n}";

pub fn setup(output: Option<&str>, level: log::LevelFilter) -> anyhow::Result<()> {
    let config = build_config(output, level)?;
    log4rs::init_config(config)?;
    Ok(())
}

fn build_config(output: Option<&str>, level: log::LevelFilter) -> anyhow::Result<Config> {
    let console_appender = {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        Appender::builder().build("console", Box::new(console))
    };

    let file_appender = match output {
        Some(path) => {
            let logfile = FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                .build(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            Some(Appender::builder().build("logfile", Box::new(logfile)))
        }
        None => None,
    };

    let mut config_builder = Config::builder().appender(console_appender);
    let mut root_builder = Root::builder().appender("console");

    if let Some(appender) = file_appender {
        config_builder = config_builder.appender(appender);
        root_builder = root_builder.appender("logfile");
    }

    let config = config_builder.build(root_builder.build(level))?;
    Ok(config)
}
