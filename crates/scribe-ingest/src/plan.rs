//! Turn probed capabilities into an ordered [`Extractor`].

use std::sync::Arc;

use scribe_core::{
    Config, ExtractionStrategy, Extractor, NativeRenderOcr, RasterizeAllOcr, StrategyKind,
    TextLayerOnly, Unavailable,
};

use crate::probe::{Capabilities, Missing, probe};

/// Availability of one strategy, for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyStatus {
    pub kind: StrategyKind,
    pub available: bool,
    /// Backend names when available, reason and remediation otherwise.
    pub detail: String,
}

/// Probe the environment and build the extraction plan.
pub fn build_extractor(config: &Config) -> Extractor {
    let extractor = plan(config, probe(config));
    tracing::info!(
        recognizer = extractor.recognizer_name().unwrap_or("none"),
        strategies = ?extractor.strategy_kinds(),
        unavailable = extractor.unavailable().len(),
        "extraction plan ready"
    );
    extractor
}

/// Order the available strategies by `config.strategy_order`.
///
/// Pure: all environment access happens in [`probe`].
pub fn plan(config: &Config, caps: Capabilities) -> Extractor {
    let mut builder = Extractor::builder();

    match &caps.recognizer {
        Ok(recognizer) => builder = builder.recognizer(recognizer.clone()),
        Err(missing) => {
            builder = builder.unavailable(Unavailable::recognizer(
                &missing.reason,
                &missing.remediation,
            ))
        }
    }

    for kind in StrategyKind::ALL {
        if !config.strategy_order.contains(&kind) {
            builder = builder.unavailable(Unavailable::strategy(
                kind,
                "disabled in configuration",
                format!("add `{kind}` to pdf.strategies"),
            ));
        }
    }

    let mut seen = Vec::new();
    for &kind in &config.strategy_order {
        if seen.contains(&kind) {
            continue;
        }
        seen.push(kind);
        match resolve(kind, config, &caps) {
            Ok(strategy) => builder = builder.strategy(strategy),
            Err(missing) => {
                tracing::debug!(strategy = %kind, reason = %missing.reason, "strategy unavailable");
                builder = builder.unavailable(Unavailable::strategy(
                    kind,
                    missing.reason,
                    missing.remediation,
                ));
            }
        }
    }

    builder.build()
}

fn resolve(
    kind: StrategyKind,
    config: &Config,
    caps: &Capabilities,
) -> Result<Arc<dyn ExtractionStrategy>, Missing> {
    let scale = config.render_scale;
    match kind {
        StrategyKind::NativeOcr => {
            let renderer = caps.renderer.clone()?;
            let recognizer = needs_recognizer(caps)?;
            Ok(Arc::new(
                NativeRenderOcr::new(renderer.reader, renderer.rasterizer, recognizer)
                    .with_scale(scale),
            ))
        }
        StrategyKind::TextLayer => Ok(Arc::new(TextLayerOnly::new(caps.text_reader.clone()?))),
        StrategyKind::RasterOcr => {
            let rasterizer = caps.rasterizer.clone()?;
            let recognizer = needs_recognizer(caps)?;
            Ok(Arc::new(RasterizeAllOcr::new(rasterizer, recognizer).with_scale(scale)))
        }
        StrategyKind::HostedOcr => caps.hosted.clone(),
    }
}

fn needs_recognizer(
    caps: &Capabilities,
) -> Result<Arc<dyn scribe_core::TextRecognizer>, Missing> {
    caps.recognizer.clone().map_err(|m| Missing {
        reason: format!("no OCR engine: {}", m.reason),
        remediation: m.remediation,
    })
}

/// Availability of every strategy under `config`, in configured order
/// followed by the disabled ones.
pub fn describe(config: &Config) -> Vec<StrategyStatus> {
    statuses(&build_extractor(config))
}

/// Availability of every strategy known to an already built plan.
pub fn statuses(extractor: &Extractor) -> Vec<StrategyStatus> {
    let mut out: Vec<StrategyStatus> = extractor
        .strategy_kinds()
        .into_iter()
        .map(|kind| StrategyStatus {
            kind,
            available: true,
            detail: kind.description().to_string(),
        })
        .collect();

    for missing in extractor.unavailable() {
        let Ok(kind) = missing.name.parse::<StrategyKind>() else {
            continue;
        };
        out.push(StrategyStatus {
            kind,
            available: false,
            detail: format!("{}; {}", missing.reason, missing.remediation),
        });
    }
    out
}
