//! Pipeline configuration.

use serde::Deserialize;

/// Settings for the flatten-to-parquet pipeline binary, loaded from a TOML
/// file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Directory of fetched result-page XML files.
    pub input_dir: String,
    /// Directory receiving one parquet file per result set.
    pub output_dir: String,
    /// Worker threads; 0 or absent lets the pool decide.
    pub threads: Option<usize>,
    /// Request V3000 structure files downstream instead of V2000.
    pub sd_v3: Option<bool>,
    /// When set, logs roll daily into this directory instead of stdout.
    pub log_dir: Option<String>,
}

impl PipelineConfig {
    pub fn load(path: &str) -> anyhow::Result<PipelineConfig> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "input_dir = \"pages\"\noutput_dir = \"out\"\nthreads = 4\nsd_v3 = true"
        )
        .unwrap();

        let cfg = PipelineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.input_dir, "pages");
        assert_eq!(cfg.output_dir, "out");
        assert_eq!(cfg.threads, Some(4));
        assert_eq!(cfg.sd_v3, Some(true));
        assert!(cfg.log_dir.is_none());
    }
}
