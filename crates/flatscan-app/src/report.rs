// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON run report — settings used and the detection outcome of every page.

use std::path::{Path, PathBuf};

use flatscan_core::error::Result;
use flatscan_core::{DetectionOutcome, EnhancerConfig};
use flatscan_document::EnhancedDocument;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub config: EnhancerConfig,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    /// 1-based page number.
    pub page: usize,
    pub outcome: DetectionOutcome,
    /// Size of the binary page in pixels.
    pub width: u32,
    pub height: u32,
}

impl RunReport {
    pub fn new(
        inputs: &[PathBuf],
        output: &Path,
        config: &EnhancerConfig,
        document: &EnhancedDocument,
    ) -> Self {
        let pages = document
            .pages
            .iter()
            .map(|page| PageReport {
                page: page.index + 1,
                outcome: page.outcome.clone(),
                width: page.image.width(),
                height: page.image.height(),
            })
            .collect();

        Self {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
            config: config.clone(),
            pages,
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_document::ScanEnhancer;
    use image::{DynamicImage, GrayImage, Luma};

    #[test]
    fn report_lists_every_page() {
        let enhancer = ScanEnhancer::new(EnhancerConfig::default()).unwrap();
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 40, Luma([210u8])));
        let document = enhancer.enhance_pages(vec![blank.clone(), blank]).unwrap();

        let report = RunReport::new(
            &[PathBuf::from("a.png"), PathBuf::from("b.png")],
            Path::new("out.pdf"),
            enhancer.config(),
            &document,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let pages = value["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1]["page"], 2);
        assert_eq!(pages[0]["outcome"]["kind"], "not_found");
        assert_eq!(pages[0]["width"], 100);
        assert_eq!(value["config"]["dpi"], 200);
    }
}
