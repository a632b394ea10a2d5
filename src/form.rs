//! Reservation form view-model.
//!
//! The form, the edit-mode flag, the loaded list and the search term live in
//! one [`FormState`] value. User and network events go through [`reduce`],
//! which returns the next state without side effects; [`submission`] tells
//! the client which request to send.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::{Reservation, Status};
use crate::service::{ReservationPayload, TableField};

pub const MSG_REQUIRED: &str = "Todos os campos são obrigatórios.";
pub const MSG_LOAD_FAILED: &str = "Erro ao carregar reservas.";
pub const MSG_SAVE_FAILED: &str = "Erro ao salvar reserva.";
pub const MSG_DELETE_FAILED: &str = "Erro ao deletar reserva.";

/// Raw text of every input, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub name: String,
    pub table: String,
    pub status: Status,
    pub date: String,
    pub contact: String,
    pub time: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            table: String::new(),
            status: Status::Reservado,
            date: String::new(),
            contact: String::new(),
            time: String::new(),
        }
    }
}

impl FormFields {
    fn from_reservation(r: &Reservation) -> Self {
        Self {
            name: r.name.clone(),
            table: r.table.to_string(),
            status: r.status,
            date: r.date.format("%Y-%m-%d").to_string(),
            contact: r.contact.clone(),
            time: r.time.clone(),
        }
    }

    fn is_complete(&self) -> bool {
        [&self.name, &self.table, &self.date, &self.contact, &self.time]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    fn payload(&self) -> ReservationPayload {
        let table = match self.table.trim().parse() {
            Ok(n) => TableField::Number(n),
            Err(_) => TableField::Text(self.table.clone()),
        };
        ReservationPayload {
            name: Some(self.name.clone()),
            table: Some(table),
            date: Some(self.date.clone()),
            contact: Some(self.contact.clone()),
            time: Some(self.time.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Table,
    Date,
    Contact,
    Time,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    pub form: FormFields,
    pub editing: Option<Ulid>,
    pub reservations: Vec<Reservation>,
    pub search: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    FieldChanged(Field, String),
    StatusChanged(Status),
    SearchChanged(String),
    Loaded(Vec<Reservation>),
    LoadFailed,
    StartEdit(Reservation),
    CancelEdit,
    Submitted,
    Saved(Reservation),
    SaveFailed(Option<String>),
    Deleted(Ulid),
    DeleteFailed,
}

/// The request a submit should issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(ReservationPayload),
    Update(Ulid, ReservationPayload),
}

pub fn reduce(mut state: FormState, event: FormEvent) -> FormState {
    match event {
        FormEvent::FieldChanged(field, value) => {
            let slot = match field {
                Field::Name => &mut state.form.name,
                Field::Table => &mut state.form.table,
                Field::Date => &mut state.form.date,
                Field::Contact => &mut state.form.contact,
                Field::Time => &mut state.form.time,
            };
            *slot = value;
        }
        FormEvent::StatusChanged(status) => state.form.status = status,
        FormEvent::SearchChanged(term) => state.search = term,
        FormEvent::Loaded(list) => state.reservations = list,
        FormEvent::LoadFailed => state.error = Some(MSG_LOAD_FAILED.into()),
        FormEvent::StartEdit(r) => {
            state.form = FormFields::from_reservation(&r);
            state.editing = Some(r.id);
        }
        FormEvent::CancelEdit => {
            state.form = FormFields::default();
            state.editing = None;
        }
        FormEvent::Submitted => {
            state.error = (!state.form.is_complete()).then(|| MSG_REQUIRED.into());
        }
        FormEvent::Saved(saved) => {
            match state.editing {
                Some(id) => {
                    for r in state.reservations.iter_mut().filter(|r| r.id == id) {
                        *r = saved.clone();
                    }
                }
                None => state.reservations.push(saved),
            }
            state.form = FormFields::default();
            state.editing = None;
            state.error = None;
        }
        FormEvent::SaveFailed(message) => {
            state.error = Some(message.unwrap_or_else(|| MSG_SAVE_FAILED.into()));
        }
        FormEvent::Deleted(id) => state.reservations.retain(|r| r.id != id),
        FormEvent::DeleteFailed => state.error = Some(MSG_DELETE_FAILED.into()),
    }
    state
}

/// Reservations whose name contains the search term, ignoring case.
pub fn visible(state: &FormState) -> Vec<&Reservation> {
    let term = state.search.to_lowercase();
    state
        .reservations
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&term))
        .collect()
}

pub fn submission(state: &FormState) -> Result<Submission, &'static str> {
    if !state.form.is_complete() {
        return Err(MSG_REQUIRED);
    }
    let payload = state.form.payload();
    Ok(match state.editing {
        Some(id) => Submission::Update(id, payload),
        None => Submission::Create(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reservation(name: &str, table: u32) -> Reservation {
        Reservation {
            id: Ulid::new(),
            name: name.into(),
            table,
            status: Status::Reservado,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            contact: "x@example.com".into(),
            time: "12:00".into(),
        }
    }

    fn filled() -> FormState {
        [
            (Field::Name, "Ana Souza"),
            (Field::Table, "5"),
            (Field::Date, "2025-01-10"),
            (Field::Contact, "ana@example.com"),
            (Field::Time, "12:00"),
        ]
        .into_iter()
        .fold(FormState::default(), |s, (f, v)| {
            reduce(s, FormEvent::FieldChanged(f, v.into()))
        })
    }

    #[test]
    fn empty_field_blocks_submit() {
        let state = reduce(
            filled(),
            FormEvent::FieldChanged(Field::Contact, "  ".into()),
        );
        let state = reduce(state, FormEvent::Submitted);
        assert_eq!(state.error.as_deref(), Some(MSG_REQUIRED));
        assert_eq!(submission(&state), Err(MSG_REQUIRED));
    }

    #[test]
    fn new_form_submits_create() {
        let state = reduce(filled(), FormEvent::Submitted);
        assert_eq!(state.error, None);
        let Ok(Submission::Create(p)) = submission(&state) else {
            panic!("expected create");
        };
        assert_eq!(p.table, Some(TableField::Number(5)));
        assert_eq!(p.time.as_deref(), Some("12:00"));
    }

    #[test]
    fn edit_flow_replaces_in_place() {
        let a = reservation("Ana", 1);
        let b = reservation("Bruno", 2);
        let state = reduce(FormState::default(), FormEvent::Loaded(vec![a.clone(), b.clone()]));
        let state = reduce(state, FormEvent::StartEdit(b.clone()));
        assert_eq!(state.editing, Some(b.id));
        assert_eq!(state.form.table, "2");
        assert_eq!(state.form.date, "2025-01-10");
        assert!(matches!(submission(&state), Ok(Submission::Update(id, _)) if id == b.id));

        let mut saved = b.clone();
        saved.time = "19:00".into();
        let state = reduce(state, FormEvent::Saved(saved));
        assert_eq!(state.reservations.len(), 2);
        assert_eq!(state.reservations[1].time, "19:00");
        assert_eq!(state.editing, None);
        assert_eq!(state.form, FormFields::default());
    }

    #[test]
    fn save_appends_when_not_editing() {
        let state = reduce(filled(), FormEvent::SaveFailed(None));
        assert_eq!(state.error.as_deref(), Some(MSG_SAVE_FAILED));
        let state = reduce(state, FormEvent::Saved(reservation("Ana Souza", 5)));
        assert_eq!(state.reservations.len(), 1);
        assert_eq!(state.error, None);
        assert!(state.form.name.is_empty());
    }

    #[test]
    fn search_filters_by_name_ignoring_case() {
        let state = reduce(
            FormState::default(),
            FormEvent::Loaded(vec![reservation("Ana Souza", 1), reservation("Bruno", 2)]),
        );
        let state = reduce(state, FormEvent::SearchChanged("SOU".into()));
        let names: Vec<_> = visible(&state).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Ana Souza"]);
    }

    #[test]
    fn delete_removes_from_list() {
        let a = reservation("Ana", 1);
        let state = reduce(FormState::default(), FormEvent::Loaded(vec![a.clone()]));
        let state = reduce(state, FormEvent::Deleted(a.id));
        assert!(state.reservations.is_empty());
        let state = reduce(state, FormEvent::DeleteFailed);
        assert_eq!(state.error.as_deref(), Some(MSG_DELETE_FAILED));
    }
}
