use field_core::FieldElement;

use crate::error::SyncError;
use crate::reader::CellReader;
use crate::schema::MapSlotTemplate;
use crate::sync::StateSync;

/// Lazy, restartable walk over a counter-indexed list of index entries.
///
/// The counter was captured when the pass began; a counter that grows while
/// pages are read does not extend the pass. Callers wanting the newer tail
/// start another pass.
pub struct Paginator<'a, R> {
    sync: &'a StateSync<R>,
    template: MapSlotTemplate,
    captured: u64,
    cursor: u64,
    page_size: u64,
}

impl<'a, R: CellReader> Paginator<'a, R> {
    pub(crate) fn new(
        sync: &'a StateSync<R>,
        template: MapSlotTemplate,
        captured: u64,
        page_size: u64,
    ) -> Self {
        Self {
            sync,
            template,
            captured,
            cursor: 0,
            page_size: page_size.max(1),
        }
    }

    /// Counter value observed at the start of the pass.
    pub fn captured_count(&self) -> u64 {
        self.captured
    }

    /// Next fixed-size page of index entries, or None once exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<FieldElement>>, SyncError> {
        if self.cursor >= self.captured {
            return Ok(None);
        }
        let end = (self.cursor + self.page_size).min(self.captured);
        let mut entries = Vec::with_capacity((end - self.cursor) as usize);
        for index in self.cursor..end {
            entries.push(self.sync.read_index_entry(&self.template, index).await?);
        }
        self.cursor = end;
        Ok(Some(entries))
    }

    /// Restart the pass from the first entry, keeping the captured counter.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
