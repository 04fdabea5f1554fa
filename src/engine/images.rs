//! Image verbs: pull, list and remove.

use tracing::info;

use super::options::{PullOptions, RemoveImageOptions, validate_image_reference};
use super::{Engine, args};
use crate::decode::{ImageInspectRecord, ImageRecord, decode_json_lines};
use crate::error::{DecodeError, Result};
use crate::model::Image;
use crate::process::ProcessRunner;

const JSON_FORMAT: &str = "{{json .}}";

impl<R: ProcessRunner> Engine<R> {
    /// Pull `repository:tag` and return the pulled image.
    ///
    /// The image id is read back with `image inspect` once the pull
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError` for a blank repository or tag, or a
    /// repository that already carries a tag. Returns `ProcessError` when the
    /// runtime fails and `DecodeError` when the inspect output is not exactly
    /// one image record.
    pub fn pull(&self, repository: &str, options: &PullOptions) -> Result<Image> {
        validate_image_reference(repository, &options.tag)?;
        let reference = format!("{repository}:{}", options.tag);

        self.invoke(args(["pull", &reference]))?;
        let output = self.invoke(args([
            "image",
            "inspect",
            "--format",
            JSON_FORMAT,
            &reference,
        ]))?;
        let record = single_record::<ImageInspectRecord>("image inspect record", output.stdout())?;

        info!(image = %reference, id = %record.id, "pulled image");
        Ok(Image::new(repository, options.tag.clone(), record.id))
    }

    /// List local images.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when any
    /// line is not an image record.
    pub fn images(&self) -> Result<Vec<Image>> {
        let output = self.invoke(args(["images", "--no-trunc", "--format", JSON_FORMAT]))?;
        let records: Vec<ImageRecord> = decode_json_lines("image record", output.stdout())?;
        Ok(records.into_iter().map(Image::from).collect())
    }

    /// Remove `image` by its `repository:tag` reference.
    ///
    /// Returns `true` when the runtime reports untagging or deleting the
    /// image.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime refuses, for example because a
    /// container still uses the image and `force` is off.
    pub fn remove_image(&self, image: &Image, options: &RemoveImageOptions) -> Result<bool> {
        let reference = image.reference();
        let mut argv = args(["rmi"]);
        if options.force {
            argv.push(String::from("--force"));
        }
        argv.push(reference.clone());

        let output = self.invoke(argv)?;
        let removed = output
            .stdout()
            .lines()
            .map(str::trim)
            .any(|line| line.starts_with("Untagged:") || line.starts_with("Deleted:"));
        info!(image = %reference, removed, "removed image");
        Ok(removed)
    }
}

fn single_record<T: serde::de::DeserializeOwned>(
    expected: &'static str,
    raw: &str,
) -> std::result::Result<T, DecodeError> {
    let mut records = decode_json_lines::<T>(expected, raw)?.into_iter();
    match (records.next(), records.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => Err(DecodeError::new(expected, "output was empty", raw)),
        (Some(_), Some(_)) => Err(DecodeError::new(
            expected,
            "expected exactly one record",
            raw,
        )),
    }
}
