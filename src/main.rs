//! Flatten-to-parquet pipeline.
//!
//! Reads a directory of fetched result-page XML files, flattens each page
//! on its own worker (one ResultSet and one canonicalization cache per
//! page), partitions the rows by result-set name, and writes one parquet
//! file per partition.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rexflat::{table, DefaultLabels, Element, FlatRecord, PipelineConfig, ResultSet};

fn main() -> Result<()> {
    let cfg_path = std::env::args().nth(1).unwrap_or_else(|| "rexflat.toml".to_string());
    let cfg = PipelineConfig::load(&cfg_path)
        .with_context(|| format!("loading config from {cfg_path}"))?;
    let _guard = init_logging(cfg.log_dir.as_deref());

    let files = xml_files(&cfg.input_dir)
        .with_context(|| format!("scanning input dir {}", cfg.input_dir))?;
    info!(files = files.len(), input_dir = %cfg.input_dir, "starting flatten pipeline");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.threads.unwrap_or(0))
        .build()?;

    let partitions: DashMap<String, Vec<FlatRecord>> = DashMap::new();
    let labels = DefaultLabels;
    let sd_v3 = cfg.sd_v3.unwrap_or(false);

    pool.install(|| {
        files.par_iter().for_each(|path| {
            let xml = match std::fs::read_to_string(path) {
                Ok(xml) => xml,
                Err(err) => {
                    warn!(file = %path.display(), %err, "unreadable page, skipping");
                    return;
                }
            };
            let doc = match Element::parse(&xml) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(file = %path.display(), %err, "unparseable page, skipping");
                    return;
                }
            };

            let mut results = ResultSet::from_response(&doc, sd_v3);
            let rows = results.flatten(&doc, &labels);
            info!(
                file = %path.display(),
                rows = rows.len(),
                status = results.status(),
                resultname = results.result_name(),
                canon = results.canon_entries(),
                "flattened page"
            );
            if rows.is_empty() {
                return;
            }

            let key = partition_key(results.result_name());
            partitions.entry(key).or_default().extend(rows);
        });
    });

    std::fs::create_dir_all(&cfg.output_dir)?;
    for entry in partitions.iter() {
        let (schema, chunk) = table::to_columns(entry.value());
        let path = Path::new(&cfg.output_dir).join(format!("{}.parquet", entry.key()));
        let bytes = table::write_parquet(&path, schema, chunk)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(file = %path.display(), rows = entry.value().len(), bytes, "wrote partition");
    }

    Ok(())
}

fn xml_files(dir: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    files.sort();
    Ok(files)
}

/// Result-set names become file names; keep them filesystem-safe.
fn partition_key(result_name: &str) -> String {
    if result_name.is_empty() {
        return "unnamed".to_string();
    }
    result_name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

fn init_logging(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rexflat.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
            None
        }
    }
}
