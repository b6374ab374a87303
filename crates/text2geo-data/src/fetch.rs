//! Fetching GeoNames dumps from the public export server.
//!
//! Each dataset is built from one zip per source (`RU.zip`, `UA.zip`, ... or
//! `cities1000.zip`). Archives are downloaded concurrently into temporary
//! files, the dump inside each is extracted, and the result goes through
//! [`prepare_dataset`] like locally supplied dumps do.

use std::fs::File;
use std::path::{Path, PathBuf};

use futures::{StreamExt, future::try_join_all};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use zip::{ZipArchive, result::ZipError};

use super::{DataError, Dataset, Result, dataset_path, prepare_dataset};

pub const GEONAMES_BASE_URL: &str = "https://download.geonames.org/export/dump";

/// Country archives ship this alongside the dump itself.
const README_ENTRY: &str = "readme.txt";

const PROGRESS_TEMPLATE: &str =
    "{msg:>20} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})";

/// URL of the zipped dump for a source file stem (`RU`, `cities1000`).
pub fn dump_url(stem: &str) -> String {
    format!("{GEONAMES_BASE_URL}/{stem}.zip")
}

/// Download, extract and prepare `dataset`.
///
/// Returns the existing CSV untouched if the dataset was already prepared, so
/// this is safe to call before every open.
#[instrument(name = "Download dataset", skip(data_dir), level = "info")]
pub fn download_dataset(dataset: Dataset, data_dir: Option<&Path>) -> Result<PathBuf> {
    let output_path = dataset_path(dataset, data_dir);
    if output_path.exists() {
        info!(path = ?output_path, "Dataset already prepared");
        return Ok(output_path);
    }

    let t_download = std::time::Instant::now();
    let stems = dataset.source_files();
    let rt = tokio::runtime::Runtime::new()?;

    let archives = rt.block_on(async {
        let client = Client::new();
        let progress = MultiProgress::new();
        try_join_all(
            stems
                .iter()
                .map(|stem| download_to_temp_file(&client, &progress, dump_url(stem))),
        )
        .await
    })?;
    info!(
        archives = archives.len(),
        elapsed_seconds = ?t_download.elapsed(),
        "Downloads complete"
    );

    let workdir = tempfile::tempdir()?;
    let dumps = stems
        .iter()
        .zip(&archives)
        .map(|(stem, archive)| extract_dump(archive.path(), stem, workdir.path()))
        .collect::<Result<Vec<_>>>()?;

    prepare_dataset(&dumps, dataset, data_dir)
}

fn download_error(url: &str, err: &reqwest::Error) -> DataError {
    DataError::Download {
        url: url.to_owned(),
        message: err.to_string(),
    }
}

async fn download_to_temp_file(
    client: &Client,
    progress: &MultiProgress,
    url: String,
) -> Result<NamedTempFile> {
    info!(url, "Starting download");
    let response = client
        .get(&url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| download_error(&url, &e))?;

    let pb = progress.add(ProgressBar::new(response.content_length().unwrap_or(0)));
    pb.set_style(
        ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░"),
    );
    pb.set_message(url.rsplit('/').next().unwrap_or(&url).to_owned());

    let temp_file = NamedTempFile::with_suffix(".zip")?;
    let mut dest_file = tokio::fs::File::create(temp_file.path()).await?;

    let mut stream = response.bytes_stream();
    while let Some(item) = stream.next().await {
        let chunk = item.map_err(|e| download_error(&url, &e))?;
        dest_file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    dest_file.flush().await?;
    pb.finish_and_clear();

    Ok(temp_file)
}

/// Extract the dump for `stem` from a GeoNames archive into `dest_dir`.
///
/// Looks for `<stem>.txt` first, then for any other non-readme text entry.
/// The extracted file is always named `<stem>.txt`.
pub fn extract_dump(archive_path: &Path, stem: &str, dest_dir: &Path) -> Result<PathBuf> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let wanted = format!("{stem}.txt");

    let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    let entry_name = names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&wanted))
        .or_else(|| {
            names.iter().find(|name| {
                name.to_ascii_lowercase().ends_with(".txt")
                    && !name.eq_ignore_ascii_case(README_ENTRY)
            })
        })
        .ok_or(ZipError::FileNotFound)?;

    let mut entry = archive.by_name(entry_name)?;
    let out_path = dest_dir.join(&wanted);
    let mut out = File::create(&out_path)?;
    std::io::copy(&mut entry, &mut out)?;

    info!(entry = %entry_name, path = ?out_path, "Dump extracted");
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;
    use crate::{load_places_csv, test_data::create_test_dump};

    fn write_archive(entries: &[(&str, &[u8])]) -> NamedTempFile {
        let file = NamedTempFile::with_suffix(".zip").unwrap();
        let mut writer = ZipWriter::new(File::create(file.path()).unwrap());
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn test_dump_url() {
        assert_eq!(
            dump_url("RU"),
            "https://download.geonames.org/export/dump/RU.zip"
        );
        assert_eq!(
            dump_url("cities1000"),
            "https://download.geonames.org/export/dump/cities1000.zip"
        );
    }

    #[test]
    fn test_extract_country_dump_skips_readme() {
        let dump = std::fs::read(create_test_dump().unwrap().path()).unwrap();
        let archive = write_archive(&[
            ("readme.txt", b"GeoNames readme".as_slice()),
            ("RU.txt", dump.as_slice()),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let path = extract_dump(archive.path(), "RU", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("RU.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), dump);
    }

    #[test]
    fn test_extract_falls_back_to_other_text_entry() {
        let archive = write_archive(&[
            ("readme.txt", b"readme".as_slice()),
            ("allCities.txt", b"rows".as_slice()),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let path = extract_dump(archive.path(), "cities1000", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("cities1000.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"rows");
    }

    #[test]
    fn test_extract_without_dump_entry() {
        let archive = write_archive(&[("readme.txt", b"readme".as_slice())]);
        let dir = tempfile::tempdir().unwrap();

        let err = extract_dump(archive.path(), "RU", dir.path()).unwrap_err();
        assert!(matches!(err, DataError::Zip(ZipError::FileNotFound)));
    }

    #[test]
    fn test_extracted_dump_prepares_dataset() {
        let dump = std::fs::read(create_test_dump().unwrap().path()).unwrap();
        let archive = write_archive(&[("RU.txt", dump.as_slice())]);
        let workdir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();

        let extracted = extract_dump(archive.path(), "RU", workdir.path()).unwrap();
        let path = prepare_dataset(&[extracted], Dataset::Ru, Some(data_dir.path())).unwrap();

        let df = load_places_csv(&path).unwrap().collect().unwrap();
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_download_skips_prepared_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dataset_path(Dataset::Cis, Some(dir.path()));
        std::fs::write(&path, "geonameid\n").unwrap();

        // no network access happens when the CSV is already there
        assert_eq!(download_dataset(Dataset::Cis, Some(dir.path())).unwrap(), path);
    }

    #[test]
    fn test_download_error_message() {
        let err = DataError::Download {
            url: dump_url("XX"),
            message: "HTTP status client error (404 Not Found)".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains("XX.zip"));
        assert!(message.contains("404"));
    }
}
