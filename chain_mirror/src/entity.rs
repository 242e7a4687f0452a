//! Typed views over raw slot tuples.
//!
//! Each entity kind occupies a fixed span of consecutive slots starting at
//! its derived map slot. Uninitialized remote storage legitimately reads as
//! all-zero, so missing trailing positions decode to zero values rather than
//! erroring; only width violations and oversized tuples are decode errors.

use serde::{Deserialize, Serialize};

use field_core::{decode_signed, FieldElement};

use crate::error::DecodeError;

/// Map key identifying one logical entity (a location id, a player address
/// hash, an arrival index).
pub type EntityId = FieldElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Planet,
    Arrival,
    Artifact,
    RevealedCoordinate,
}

impl EntityKind {
    /// Logical schema field naming this kind's map.
    pub fn schema_field(self) -> &'static str {
        match self {
            EntityKind::Player => "players",
            EntityKind::Planet => "planets",
            EntityKind::Arrival => "arrivals",
            EntityKind::Artifact => "artifacts",
            EntityKind::RevealedCoordinate => "revealedCoordinates",
        }
    }

    /// Number of consecutive slots one record occupies.
    pub fn span(self) -> usize {
        match self {
            EntityKind::Player => 4,
            EntityKind::Planet => 6,
            EntityKind::Arrival => 5,
            EntityKind::Artifact => 5,
            EntityKind::RevealedCoordinate => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Planet => "planet",
            EntityKind::Arrival => "arrival",
            EntityKind::Artifact => "artifact",
            EntityKind::RevealedCoordinate => "revealed coordinate",
        }
    }
}

/// Two 64-bit sub-identifiers packed into one field: low id in bits [0,64),
/// high id in bits [64,128).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TwoIds {
    pub low: u64,
    pub high: u64,
}

impl TwoIds {
    pub fn pack(self) -> FieldElement {
        FieldElement::from(self.low as u128 | (self.high as u128) << 64)
    }

    pub fn unpack(kind: &'static str, position: usize, field: &FieldElement) -> Result<Self, DecodeError> {
        let packed = field
            .to_u128()
            .ok_or(DecodeError::ValueOutOfRange { kind, position })?;
        Ok(Self {
            low: packed as u64,
            high: (packed >> 64) as u64,
        })
    }
}

/// Arrival metadata packed into one field: departure height [0,32), arrival
/// height [32,64), type tag [64,72), distance [72,104).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrivalMeta {
    pub departure_block: u32,
    pub arrival_block: u32,
    pub arrival_type: u8,
    pub distance: u32,
}

impl ArrivalMeta {
    pub fn pack(self) -> FieldElement {
        let packed = self.departure_block as u128
            | (self.arrival_block as u128) << 32
            | (self.arrival_type as u128) << 64
            | (self.distance as u128) << 72;
        FieldElement::from(packed)
    }

    pub fn unpack(kind: &'static str, position: usize, field: &FieldElement) -> Result<Self, DecodeError> {
        let packed = field
            .to_u128()
            .ok_or(DecodeError::ValueOutOfRange { kind, position })?;
        if packed >> 104 != 0 {
            return Err(DecodeError::ValueOutOfRange { kind, position });
        }
        Ok(Self {
            departure_block: packed as u32,
            arrival_block: (packed >> 32) as u32,
            arrival_type: (packed >> 64) as u8,
            distance: (packed >> 72) as u32,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerBundle {
    pub address: FieldElement,
    pub home_planet: FieldElement,
    pub last_reveal_height: u64,
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanetBundle {
    pub owner: FieldElement,
    pub population: u64,
    pub silver: u64,
    pub level: u64,
    pub voyage_heads: TwoIds,
    pub last_updated: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrivalBundle {
    pub player: FieldElement,
    pub route: TwoIds,
    pub population: u64,
    pub silver: u64,
    pub meta: ArrivalMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub id: FieldElement,
    pub discovered_on: FieldElement,
    pub artifact_type: u64,
    pub discoverer: FieldElement,
    pub mint_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevealedCoordinateBundle {
    pub location: FieldElement,
    pub x: i64,
    pub y: i64,
    pub revealer: FieldElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityBundle {
    Player(PlayerBundle),
    Planet(PlanetBundle),
    Arrival(ArrivalBundle),
    Artifact(ArtifactBundle),
    RevealedCoordinate(RevealedCoordinateBundle),
}

impl EntityBundle {
    /// Shape a raw slot tuple into the typed record for `kind`.
    pub fn decode(kind: EntityKind, fields: &[FieldElement]) -> Result<Self, DecodeError> {
        if fields.len() > kind.span() {
            return Err(DecodeError::FieldCount {
                kind: kind.name(),
                expected: kind.span(),
                actual: fields.len(),
            });
        }
        let name = kind.name();
        match kind {
            EntityKind::Player => Ok(EntityBundle::Player(PlayerBundle {
                address: field_at(fields, 0),
                home_planet: field_at(fields, 1),
                last_reveal_height: narrow_u64(name, fields, 2)?,
                score: narrow_u64(name, fields, 3)?,
            })),
            EntityKind::Planet => Ok(EntityBundle::Planet(PlanetBundle {
                owner: field_at(fields, 0),
                population: narrow_u64(name, fields, 1)?,
                silver: narrow_u64(name, fields, 2)?,
                level: narrow_u64(name, fields, 3)?,
                voyage_heads: TwoIds::unpack(name, 4, &field_at(fields, 4))?,
                last_updated: narrow_u64(name, fields, 5)?,
            })),
            EntityKind::Arrival => Ok(EntityBundle::Arrival(ArrivalBundle {
                player: field_at(fields, 0),
                route: TwoIds::unpack(name, 1, &field_at(fields, 1))?,
                population: narrow_u64(name, fields, 2)?,
                silver: narrow_u64(name, fields, 3)?,
                meta: ArrivalMeta::unpack(name, 4, &field_at(fields, 4))?,
            })),
            EntityKind::Artifact => Ok(EntityBundle::Artifact(ArtifactBundle {
                id: field_at(fields, 0),
                discovered_on: field_at(fields, 1),
                artifact_type: narrow_u64(name, fields, 2)?,
                discoverer: field_at(fields, 3),
                mint_height: narrow_u64(name, fields, 4)?,
            })),
            EntityKind::RevealedCoordinate => {
                Ok(EntityBundle::RevealedCoordinate(RevealedCoordinateBundle {
                    location: field_at(fields, 0),
                    x: narrow_signed(name, fields, 1)?,
                    y: narrow_signed(name, fields, 2)?,
                    revealer: field_at(fields, 3),
                }))
            }
        }
    }
}

fn field_at(fields: &[FieldElement], position: usize) -> FieldElement {
    fields.get(position).cloned().unwrap_or_default()
}

fn narrow_u64(
    kind: &'static str,
    fields: &[FieldElement],
    position: usize,
) -> Result<u64, DecodeError> {
    field_at(fields, position)
        .to_u64()
        .ok_or(DecodeError::ValueOutOfRange { kind, position })
}

fn narrow_signed(
    kind: &'static str,
    fields: &[FieldElement],
    position: usize,
) -> Result<i64, DecodeError> {
    decode_signed(&field_at(fields, position))
        .map_err(|_| DecodeError::ValueOutOfRange { kind, position })
}
