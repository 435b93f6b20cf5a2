use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use petadopt_core::domain::Aggregate;

use crate::domain::events::{PetEvent, PetEventData};
use crate::error::PetsServiceError;

const MAX_NAME_LEN: usize = 100;
const PET_TYPE_CODE_LEN: std::ops::RangeInclusive<usize> = 2..=50;
const PET_TYPE_NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;

/// Trimmed, non-empty pet name of at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetName(String);

impl PetName {
    pub fn parse(raw: &str) -> Result<Self, PetsServiceError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(PetsServiceError::InvalidPetName("name is empty".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(PetsServiceError::InvalidPetName(format!(
                "name is longer than {MAX_NAME_LEN} characters"
            )));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetStatus {
    Available,
    Reserved,
    Adopted,
}

impl PetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Adopted => "adopted",
        }
    }
}

impl FromStr for PetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "adopted" => Ok(Self::Adopted),
            other => Err(anyhow::anyhow!("unknown pet status `{other}`")),
        }
    }
}

// ── Pet types ────────────────────────────────────────────────────────────────

/// Lowercase catalog key of a pet type, 2 to 50 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetTypeCode(String);

impl PetTypeCode {
    pub fn parse(raw: &str) -> Result<Self, PetsServiceError> {
        let code = raw.trim().to_lowercase();
        if !PET_TYPE_CODE_LEN.contains(&code.chars().count()) {
            return Err(PetsServiceError::InvalidPetType(format!(
                "code must be {} to {} characters",
                PET_TYPE_CODE_LEN.start(),
                PET_TYPE_CODE_LEN.end()
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn pet_type_name(raw: &str) -> Result<String, PetsServiceError> {
    let name = raw.trim();
    if !PET_TYPE_NAME_LEN.contains(&name.chars().count()) {
        return Err(PetsServiceError::InvalidPetType(format!(
            "name must be {} to {} characters",
            PET_TYPE_NAME_LEN.start(),
            PET_TYPE_NAME_LEN.end()
        )));
    }
    Ok(name.to_owned())
}

/// Catalog entry naming a kind of pet. Only active types accept new pets.
///
/// Pet types are plain entities: changes overwrite the row and raise no
/// events.
#[derive(Debug, Clone)]
pub struct PetType {
    id: Uuid,
    code: PetTypeCode,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl PetType {
    /// A new, active pet type.
    pub fn create(code: &str, name: &str) -> Result<Self, PetsServiceError> {
        Ok(Self {
            id: Uuid::now_v7(),
            code: PetTypeCode::parse(code)?,
            name: pet_type_name(name)?,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn restore(
        id: Uuid,
        code: PetTypeCode,
        name: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            code,
            name,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &PetTypeCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn update_name(&mut self, name: &str) -> Result<(), PetsServiceError> {
        self.name = pet_type_name(name)?;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), PetsServiceError> {
        if self.is_active {
            return Err(PetsServiceError::PetTypeAlreadyActive(
                self.code.to_string(),
            ));
        }
        self.is_active = true;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), PetsServiceError> {
        if !self.is_active {
            return Err(PetsServiceError::PetTypeAlreadyInactive(
                self.code.to_string(),
            ));
        }
        self.is_active = false;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

// ── Pets ─────────────────────────────────────────────────────────────────────

/// A pet offered for adoption.
#[derive(Debug, Clone)]
pub struct Pet {
    id: Uuid,
    name: PetName,
    pet_type_id: Uuid,
    status: PetStatus,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_new: bool,
    pending: Vec<PetEvent>,
}

impl Pet {
    /// A new, available pet of an active `pet_type`. Creation raises no event.
    pub fn create(name: &str, pet_type: &PetType) -> Result<Self, PetsServiceError> {
        let name = PetName::parse(name)?;
        if !pet_type.is_active() {
            return Err(PetsServiceError::PetTypeInactive(
                pet_type.code().to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            name,
            pet_type_id: pet_type.id(),
            status: PetStatus::Available,
            version: 0,
            created_at: now,
            updated_at: now,
            is_new: true,
            pending: Vec::new(),
        })
    }

    /// Rebuild a stored pet.
    pub fn restore(
        id: Uuid,
        name: PetName,
        pet_type_id: Uuid,
        status: PetStatus,
        version: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            pet_type_id,
            status,
            version,
            created_at,
            updated_at,
            is_new: false,
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &PetName {
        &self.name
    }

    pub fn pet_type_id(&self) -> Uuid {
        self.pet_type_id
    }

    pub fn status(&self) -> PetStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn reserve(&mut self) -> Result<(), PetsServiceError> {
        if self.status != PetStatus::Available {
            return Err(PetsServiceError::PetNotAvailable);
        }
        self.transition(PetStatus::Reserved, PetEvent::Reserved);
        Ok(())
    }

    pub fn adopt(&mut self) -> Result<(), PetsServiceError> {
        if self.status != PetStatus::Reserved {
            return Err(PetsServiceError::PetNotReserved);
        }
        self.transition(PetStatus::Adopted, PetEvent::Adopted);
        Ok(())
    }

    pub fn cancel_reservation(&mut self) -> Result<(), PetsServiceError> {
        if self.status != PetStatus::Reserved {
            return Err(PetsServiceError::PetNotReserved);
        }
        self.transition(PetStatus::Available, PetEvent::ReservationCancelled);
        Ok(())
    }

    fn transition(&mut self, status: PetStatus, event: fn(PetEventData) -> PetEvent) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.pending
            .push(event(PetEventData::new(self.id, self.name.as_str(), now)));
    }
}

impl Aggregate for Pet {
    type Event = PetEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn pending_events(&self) -> &[PetEvent] {
        &self.pending
    }

    fn mark_committed(&mut self, version: i32) {
        self.version = version;
        self.is_new = false;
        self.pending.clear();
    }
}
