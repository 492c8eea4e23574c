use std::{
    fs::File,
    io::{BufWriter, Write},
};

use tracing::{debug, info, warn};
use webfeat_config::Config;
use webfeat_core::{
    error::WebfeatError,
    ingest::{context_from_config, downloader_from_config, fetch_web_features},
    WebfeatResult,
};
use webfeat_dl::DownloadError;
use webfeat_manifest::{JsonManifestParser, WebFeaturesData};
use webfeat_utils::path::resolve_path;

use crate::{cli::ReportArgs, report::report};

pub async fn fetch_manifest(
    config: Config,
    output: Option<String>,
    args: &ReportArgs,
) -> WebfeatResult<()> {
    let ctx = context_from_config(&config)?;
    let downloader = downloader_from_config(&config)?;

    let task_ctx = ctx.clone();
    let task = tokio::task::spawn_blocking(move || {
        fetch_web_features(&task_ctx, &downloader, &JsonManifestParser)
    });

    let data = tokio::select! {
        result = task => {
            result.map_err(|err| WebfeatError::Custom(format!("download task failed: {err}")))??
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted, canceling download");
            ctx.cancel();
            return Err(DownloadError::Canceled.into());
        }
    };

    if let Some(output) = output {
        write_manifest(&data, &output)?;
    }

    report(&data, args);
    Ok(())
}

fn write_manifest(data: &WebFeaturesData, output: &str) -> WebfeatResult<()> {
    let path = resolve_path(output).map_err(webfeat_config::ConfigError::from)?;
    debug!("Writing manifest to {}", path.display());

    let io_err = |action: &str, source| {
        WebfeatError::IoError {
            action: format!("{action} {}", path.display()),
            source,
        }
    };

    let file = File::create(&path).map_err(|err| io_err("creating", err))?;
    let mut writer = BufWriter::new(file);
    data.write_manifest(&mut writer, true)?;
    writer.flush().map_err(|err| io_err("writing", err))?;

    info!("Manifest written to {}", path.display());
    Ok(())
}
