//! Descending-area quicksort over the container's own links.
//!
//! Entries are relinked, never copied. The last entry of each run is the
//! pivot; the run is split into larger-than-pivot and the rest, each side
//! keeping its input order, and the result is the sorted larger side, the
//! pivot, then the sorted rest. Pending runs live on an explicit work stack,
//! so call depth stays flat however long or presorted the list is.

use tracing::trace;

use super::{Container, Link, Payload};
use crate::error::{Result, TreePackError};

impl<K> Container<K> {
    /// Ok when every entry carries an image. Otherwise reports the first
    /// offending entry.
    pub fn is_sortable(&self) -> Result<()> {
        match self
            .iter()
            .enumerate()
            .find(|(_, payload)| !matches!(payload, Payload::Image(_)))
        {
            Some((index, payload)) => Err(TreePackError::UnsortablePayload {
                index,
                kind: payload.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Reorders entries by image area, largest first. Ties are not
    /// guaranteed to keep their input order.
    ///
    /// A container that fails [`Container::is_sortable`] is left untouched.
    pub fn sort(&mut self) -> Result<()> {
        self.is_sortable()?;
        let head = self.head.take();
        self.head = quicksort(head);
        trace!("container sorted by area");
        Ok(())
    }
}

fn quicksort<K>(head: Link<K>) -> Link<K> {
    // unsorted runs, the next one to emit on top
    let mut pending = vec![head];
    // emitted entries, most recent first
    let mut done: Link<K> = None;
    while let Some(mut run) = pending.pop() {
        if run.as_ref().is_none_or(|entry| entry.next.is_none()) {
            emit(&mut done, run);
            continue;
        }
        let Some(pivot) = take_last(&mut run) else {
            continue;
        };
        let pivot_area = pivot.payload.area();

        // Both sides are built by pushing to the front.
        let mut greater: Link<K> = None;
        let mut rest: Link<K> = None;
        let mut uniform = true;
        let mut link = run;
        while let Some(mut entry) = link {
            link = entry.next.take();
            let area = entry.payload.area();
            uniform &= area == pivot_area;
            let side = if area > pivot_area {
                &mut greater
            } else {
                &mut rest
            };
            entry.next = side.take();
            *side = Some(entry);
        }

        if uniform {
            // An equal-area run sorts to its own reverse: the pivot, then
            // `rest` back to front, which is how it was built.
            emit(&mut done, Some(pivot));
            emit(&mut done, rest);
            continue;
        }
        pending.push(reverse(rest));
        pending.push(Some(pivot));
        pending.push(reverse(greater));
    }
    reverse(done)
}

/// Moves every entry of `chain`, front to back, onto the front of `done`.
fn emit<K>(done: &mut Link<K>, mut chain: Link<K>) {
    while let Some(mut entry) = chain {
        chain = entry.next.take();
        entry.next = done.take();
        *done = Some(entry);
    }
}

/// Unlinks and returns the final entry.
fn take_last<K>(head: &mut Link<K>) -> Link<K> {
    let mut cursor = head;
    while cursor.as_ref().is_some_and(|entry| entry.next.is_some()) {
        if let Some(entry) = cursor {
            cursor = &mut entry.next;
        }
    }
    cursor.take()
}

fn reverse<K>(mut link: Link<K>) -> Link<K> {
    let mut reversed = None;
    while let Some(mut entry) = link {
        link = entry.next.take();
        entry.next = reversed;
        reversed = Some(entry);
    }
    reversed
}
