use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_core::{ActorId, DomainError, DomainResult, Entity, MovementId, Versioned};

/// Direction of a cash movement. The sign of a movement is derived from this,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(MovementKind::Entry),
            "exit" => Ok(MovementKind::Exit),
            other => Err(DomainError::validation(format!(
                "movement kind must be 'entry' or 'exit', got '{other}'"
            ))),
        }
    }
}

/// Strictly positive amount in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "amount must be greater than zero, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Signed contribution of this amount to the balance.
    pub fn signed(&self, kind: MovementKind) -> Decimal {
        match kind {
            MovementKind::Entry => self.0,
            MovementKind::Exit => -self.0,
        }
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to a beneficiary record owned by the registration subsystem.
///
/// Used for display joins only; ledger correctness never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectRef(pub u64);

impl core::fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Input for recording a movement, as received from the caller.
///
/// Nothing here is trusted: [`Movement::create`] re-validates every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub subject_ref: Option<SubjectRef>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewMovement {
    pub fn new(kind: MovementKind, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            subject_ref: None,
            subject_name: None,
            receipt_number: None,
            notes: None,
        }
    }

    pub fn entry(amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(MovementKind::Entry, amount, description)
    }

    pub fn exit(amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(MovementKind::Exit, amount, description)
    }

    pub fn with_subject_ref(mut self, subject: SubjectRef) -> Self {
        self.subject_ref = Some(subject);
        self
    }

    pub fn with_subject_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = Some(name.into());
        self
    }

    pub fn with_receipt_number(mut self, number: impl Into<String>) -> Self {
        self.receipt_number = Some(number.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A recorded cash entry or exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub kind: MovementKind,
    pub amount: Amount,
    pub description: String,
    pub subject_ref: Option<SubjectRef>,
    pub subject_name: Option<String>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub author: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Movement {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Movement {
    /// Validate `input` and build the version-1 record.
    pub fn create(
        id: MovementId,
        input: NewMovement,
        author: ActorId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let amount = Amount::new(input.amount)?;
        let description = required_text(input.description)?;

        Ok(Self {
            id,
            kind: input.kind,
            amount,
            description,
            subject_ref: input.subject_ref,
            subject_name: optional_text(input.subject_name),
            receipt_number: optional_text(input.receipt_number),
            notes: optional_text(input.notes),
            author,
            created_at,
            updated_at: None,
            version: 1,
        })
    }

    /// Signed contribution to the balance: entries add, exits subtract.
    pub fn signed_amount(&self) -> Decimal {
        self.amount.signed(self.kind)
    }

    /// Display name of the subject: the free-text name, falling back to the
    /// beneficiary reference.
    pub fn subject_label(&self) -> Option<String> {
        self.subject_name
            .clone()
            .or_else(|| self.subject_ref.map(|r| r.to_string()))
    }

    /// Produce the next version of this movement with `patch` applied.
    ///
    /// `self` is left untouched so the caller keeps the prior snapshot.
    pub fn patched(&self, patch: &MovementPatch, at: DateTime<Utc>) -> DomainResult<Self> {
        if patch.is_empty() {
            return Err(DomainError::validation("update contains no fields"));
        }

        let mut next = self.clone();
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(amount) = patch.amount {
            next.amount = Amount::new(amount)?;
        }
        if let Some(description) = &patch.description {
            next.description = required_text(description.clone())?;
        }
        if let Some(subject_ref) = patch.subject_ref {
            next.subject_ref = subject_ref;
        }
        if let Some(subject_name) = &patch.subject_name {
            next.subject_name = optional_text(subject_name.clone());
        }
        if let Some(receipt_number) = &patch.receipt_number {
            next.receipt_number = optional_text(receipt_number.clone());
        }
        if let Some(notes) = &patch.notes {
            next.notes = optional_text(notes.clone());
        }

        next.updated_at = Some(at);
        next.version = self.version + 1;
        Ok(next)
    }

    /// Human-readable list of the fields that differ between `self` and `next`.
    pub fn describe_changes(&self, next: &Movement) -> String {
        let mut changes = Vec::new();
        if self.kind != next.kind {
            changes.push(format!("kind {} -> {}", self.kind, next.kind));
        }
        if self.amount != next.amount {
            changes.push(format!("amount {} -> {}", self.amount, next.amount));
        }
        if self.description != next.description {
            changes.push(format!(
                "description '{}' -> '{}'",
                self.description, next.description
            ));
        }
        if self.subject_ref != next.subject_ref {
            changes.push("subject reference".to_string());
        }
        if self.subject_name != next.subject_name {
            changes.push("subject name".to_string());
        }
        if self.receipt_number != next.receipt_number {
            changes.push("receipt number".to_string());
        }
        if self.notes != next.notes {
            changes.push("notes".to_string());
        }

        if changes.is_empty() {
            "no effective changes".to_string()
        } else {
            changes.join("; ")
        }
    }
}

/// Partial update of a movement. `None` leaves a field unchanged; for the
/// optional text fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPatch {
    #[serde(default)]
    pub kind: Option<MovementKind>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject_ref: Option<Option<SubjectRef>>,
    #[serde(default)]
    pub subject_name: Option<Option<String>>,
    #[serde(default)]
    pub receipt_number: Option<Option<String>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

impl MovementPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.subject_ref.is_none()
            && self.subject_name.is_none()
            && self.receipt_number.is_none()
            && self.notes.is_none()
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }
}

fn required_text(value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("description is required"));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
