//! Optimistic editing of an ordered collection.
//!
//! A [`CollectionEditor`] owns the client-side copy of a collection of opaque
//! identifiers. Drags and deletes are applied locally first and produce a
//! [`Submission`] for the server; [`CollectionEditor::resolve`] then either
//! reconciles with the refetched authoritative order or, for a refused change,
//! enters `RollingBack` until [`CollectionEditor::roll_back`] restores the last
//! order the server confirmed.
//!
//! ```text
//! Idle -> Dragging -> Submitting -> Idle
//!                              \-> RollingBack -> Idle
//! ```

use std::fmt;

use thiserror::Error;

use crate::transport::CollectionSync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Dragging,
    Submitting,
    RollingBack,
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EditorState::Idle => "idle",
            EditorState::Dragging => "dragging",
            EditorState::Submitting => "submitting",
            EditorState::RollingBack => "rolling back",
        };
        f.write_str(label)
    }
}

/// Change the server is asked to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    /// Replace the stored order with the full list.
    Reorder(Vec<T>),
    /// Drop `item`, found at `index` in the local copy.
    Remove { index: usize, item: T },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An optimistic change waiting for the server's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission<T> {
    pub ticket: Ticket,
    pub change: Change<T>,
}

/// What came back for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Accepted; carries the refetched authoritative collection.
    Confirmed(Vec<T>),
    /// Accepted, but the refetch failed.
    ConfirmedUnverified(String),
    /// Refused by the server or lost in transit.
    Rejected(String),
}

/// Transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Warning(message) => write!(f, "warning: {message}"),
            Notice::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("a change is still being submitted")]
    Busy,
    #[error("item is not part of the collection")]
    UnknownItem,
    #[error("no item at index {index} (collection has {len})")]
    NotFound { index: usize, len: usize },
    #[error("ticket {0} does not match the outstanding submission")]
    StaleTicket(Ticket),
    #[error("no refused change to roll back")]
    NothingToRollBack,
}

/// How a synchronised drag or delete ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to submit.
    Unchanged,
    Confirmed,
    /// The server accepted the change but the collection could not be refetched.
    Unverified,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct CollectionEditor<T> {
    items: Vec<T>,
    confirmed: Vec<T>,
    state: EditorState,
    dragged: Option<T>,
    pending: Option<Ticket>,
    next_ticket: u64,
    notices: Vec<Notice>,
}

impl<T> CollectionEditor<T>
where
    T: Clone + PartialEq + fmt::Debug,
{
    /// Start from a collection the server just returned.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            confirmed: items.clone(),
            items,
            state: EditorState::Idle,
            dragged: None,
            pending: None,
            next_ticket: 1,
            notices: Vec::new(),
        }
    }

    /// Local collection, including any unconfirmed change.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Last collection the server confirmed.
    pub fn confirmed(&self) -> &[T] {
        &self.confirmed
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn dragged(&self) -> Option<&T> {
        self.dragged.as_ref()
    }

    pub fn item_at(&self, index: usize) -> Result<&T, EditorError> {
        self.items.get(index).ok_or(EditorError::NotFound {
            index,
            len: self.items.len(),
        })
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn begin_drag(&mut self, item: &T) -> Result<(), EditorError> {
        self.ensure_not_busy()?;
        if !self.items.contains(item) {
            return Err(EditorError::UnknownItem);
        }
        self.dragged = Some(item.clone());
        self.state = EditorState::Dragging;
        Ok(())
    }

    /// Whether `target` would accept the item being dragged.
    pub fn drag_over(&self, target: &T) -> bool {
        self.state == EditorState::Dragging
            && self.dragged.as_ref() != Some(target)
            && self.items.contains(target)
    }

    pub fn cancel_drag(&mut self) {
        if self.state == EditorState::Dragging {
            self.dragged = None;
            self.state = EditorState::Idle;
        }
    }

    /// Move `source` to the position `target` occupies and shift the rest.
    ///
    /// Returns `None` when there is nothing to submit: dropping an item on
    /// itself, or naming an item the local copy does not hold.
    pub fn complete_drag(
        &mut self,
        source: &T,
        target: &T,
    ) -> Result<Option<Submission<T>>, EditorError> {
        self.ensure_not_busy()?;
        self.dragged = None;
        self.state = EditorState::Idle;

        if source == target {
            return Ok(None);
        }
        let positions = (
            self.items.iter().position(|item| item == source),
            self.items.iter().position(|item| item == target),
        );
        let (Some(from), Some(to)) = positions else {
            return Ok(None);
        };

        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(Some(self.submit(Change::Reorder(self.items.clone()))))
    }

    pub fn delete_item(&mut self, index: usize) -> Result<Submission<T>, EditorError> {
        self.ensure_not_busy()?;
        if index >= self.items.len() {
            return Err(EditorError::NotFound {
                index,
                len: self.items.len(),
            });
        }
        self.dragged = None;
        let item = self.items.remove(index);
        Ok(self.submit(Change::Remove { index, item }))
    }

    /// Settle the outstanding submission.
    ///
    /// A rejection leaves the editor in `RollingBack` with the optimistic
    /// order still showing; new changes are refused until [`Self::roll_back`].
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        resolution: Resolution<T>,
    ) -> Result<(), EditorError> {
        if self.state != EditorState::Submitting || self.pending != Some(ticket) {
            return Err(EditorError::StaleTicket(ticket));
        }
        self.pending = None;

        match resolution {
            Resolution::Confirmed(authoritative) => {
                self.items = authoritative;
                self.confirmed = self.items.clone();
            }
            Resolution::ConfirmedUnverified(reason) => {
                self.confirmed = self.items.clone();
                self.notices.push(Notice::Warning(format!(
                    "change saved but the collection could not be refreshed: {reason}"
                )));
            }
            Resolution::Rejected(reason) => {
                self.notices
                    .push(Notice::Error(format!("change was not saved: {reason}")));
                self.state = EditorState::RollingBack;
                return Ok(());
            }
        }

        self.state = EditorState::Idle;
        Ok(())
    }

    /// Restore the last confirmed order after a rejection.
    pub fn roll_back(&mut self) -> Result<(), EditorError> {
        if self.state != EditorState::RollingBack {
            return Err(EditorError::NothingToRollBack);
        }
        self.items = self.confirmed.clone();
        self.state = EditorState::Idle;
        Ok(())
    }

    fn submit(&mut self, change: Change<T>) -> Submission<T> {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);
        self.state = EditorState::Submitting;
        Submission { ticket, change }
    }

    fn ensure_not_busy(&self) -> Result<(), EditorError> {
        if matches!(
            self.state,
            EditorState::Submitting | EditorState::RollingBack
        ) {
            return Err(EditorError::Busy);
        }
        Ok(())
    }
}

/// Drag `source` onto `target` and run the submission against `sync`.
pub async fn drag_and_sync<T, S>(
    editor: &mut CollectionEditor<T>,
    sync: &S,
    source: &T,
    target: &T,
) -> Result<SyncOutcome, EditorError>
where
    T: Clone + PartialEq + fmt::Debug + Send + Sync,
    S: CollectionSync<T> + ?Sized,
{
    editor.begin_drag(source)?;
    match editor.complete_drag(source, target)? {
        Some(submission) => settle(editor, sync, submission).await,
        None => Ok(SyncOutcome::Unchanged),
    }
}

/// Delete the item at `index` and run the submission against `sync`.
pub async fn delete_and_sync<T, S>(
    editor: &mut CollectionEditor<T>,
    sync: &S,
    index: usize,
) -> Result<SyncOutcome, EditorError>
where
    T: Clone + PartialEq + fmt::Debug + Send + Sync,
    S: CollectionSync<T> + ?Sized,
{
    let submission = editor.delete_item(index)?;
    settle(editor, sync, submission).await
}

async fn settle<T, S>(
    editor: &mut CollectionEditor<T>,
    sync: &S,
    submission: Submission<T>,
) -> Result<SyncOutcome, EditorError>
where
    T: Clone + PartialEq + fmt::Debug + Send + Sync,
    S: CollectionSync<T> + ?Sized,
{
    let sent = match &submission.change {
        Change::Reorder(order) => sync.replace_order(order).await,
        Change::Remove { index, item } => sync.remove(*index, item).await,
    };

    let (resolution, outcome) = match sent {
        Err(err) => (Resolution::Rejected(err.to_string()), SyncOutcome::RolledBack),
        Ok(()) => match sync.fetch().await {
            Ok(items) => (Resolution::Confirmed(items), SyncOutcome::Confirmed),
            Err(err) => (
                Resolution::ConfirmedUnverified(err.to_string()),
                SyncOutcome::Unverified,
            ),
        },
    };

    editor.resolve(submission.ticket, resolution)?;
    if editor.state() == EditorState::RollingBack {
        editor.roll_back()?;
    }
    Ok(outcome)
}
