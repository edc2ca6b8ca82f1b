//! Single-line town layout transfer strings.
//!
//! Layouts are shared between runs (and bug reports) as
//! `hamlet:v1:<W>x<H>:<payload>`, where the payload is the JSON snapshot
//! encoded as unpadded base64. The snapshot is the declarative source of a
//! layout; [`TownLayoutSnapshot::to_layout`] rebuilds the paintable form the
//! town is constructed from.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use hamlet_core::{BuildingKind, PropKind, RectSize, TilePoint};
use hamlet_town::TownLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "hamlet";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "hamlet:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Declarative snapshot of a town layout suitable for transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TownLayoutSnapshot {
    /// Number of tile columns in the town grid.
    pub(crate) width: u32,
    /// Number of tile rows in the town grid.
    pub(crate) height: u32,
    /// Minute of day the clock starts at.
    pub(crate) clock_start: u32,
    /// Tile the player avatar starts on.
    pub(crate) player_start: TilePoint,
    /// Central plaza tile, if the town has one.
    pub(crate) plaza: Option<TilePoint>,
    /// Buildings composing the layout.
    pub(crate) buildings: Vec<SnapshotBuilding>,
    /// Props composing the layout.
    pub(crate) props: Vec<SnapshotProp>,
}

/// Building description captured within a layout snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SnapshotBuilding {
    /// Upper-left tile anchoring the building footprint.
    pub(crate) origin: TilePoint,
    /// Footprint dimensions, walls included.
    pub(crate) size: RectSize,
    /// Entrance tile on the footprint perimeter.
    pub(crate) door: TilePoint,
    /// Function the building serves.
    pub(crate) kind: BuildingKind,
}

/// Prop description captured within a layout snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SnapshotProp {
    /// Kind of prop to place.
    pub(crate) kind: PropKind,
    /// Optional label, such as sign text.
    pub(crate) name: Option<String>,
    /// Tile the prop occupies.
    pub(crate) cell: TilePoint,
}

impl TownLayoutSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard
    /// transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("layout snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.width, self.height)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, TransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
        let domain = parts.next().ok_or(TransferError::MissingPrefix)?;
        let version = parts.next().ok_or(TransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(TransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(TransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(TransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(TransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(TransferError::InvalidEncoding)?;
        let decoded: TownLayoutSnapshot =
            serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)?;

        if decoded.width != width || decoded.height != height {
            return Err(TransferError::DimensionMismatch {
                header: (width, height),
                payload: (decoded.width, decoded.height),
            });
        }

        Ok(decoded)
    }

    /// Rebuilds the paintable layout the town is constructed from.
    #[must_use]
    pub(crate) fn to_layout(&self) -> TownLayout {
        let mut layout = TownLayout::new(self.width, self.height);
        layout.set_clock_start(self.clock_start);
        layout.set_player_start(self.player_start);
        if let Some(plaza) = self.plaza {
            layout.set_plaza(plaza);
        }
        for building in &self.buildings {
            let _ = layout.add_building(building.origin, building.size, building.door, building.kind);
        }
        for prop in &self.props {
            layout.add_prop(prop.kind, prop.name.clone(), prop.cell);
        }
        layout
    }
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the payload.
    #[error("header says {}x{} but payload says {}x{}", header.0, header.1, payload.0, payload.1)]
    DimensionMismatch {
        /// Dimensions parsed from the string header.
        header: (u32, u32),
        /// Dimensions recorded inside the payload.
        payload: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), TransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| TransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| TransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| TransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(TransferError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((width, height))
}
