use tracing::debug;
use webfeat_core::WebfeatResult;
use webfeat_dl::Context;
use webfeat_manifest::read_manifest_file_with;
use webfeat_utils::path::resolve_path;

use crate::{cli::ReportArgs, report::report};

pub fn parse_manifest(file: &str, gzip: bool, args: &ReportArgs) -> WebfeatResult<()> {
    let path = resolve_path(file).map_err(webfeat_config::ConfigError::from)?;
    debug!("Parsing manifest {}", path.display());

    let data = read_manifest_file_with(&Context::background(), &path, gzip)?;
    report(&data, args);
    Ok(())
}
