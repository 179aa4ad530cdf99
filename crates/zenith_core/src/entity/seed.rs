//! Baseline-data seeding.
//!
//! Idempotence is keyed on index non-emptiness, not on a stored flag. A seed
//! interrupted after its first write therefore counts as done; seeding is
//! best-effort rather than all-or-nothing.

use super::descriptor::Entity;
use super::error::EntityResult;
use super::repository::EntityRepository;
use crate::store::KvStore;
use log::info;

impl<S: KvStore + ?Sized, T: Entity> EntityRepository<'_, S, T> {
    /// Writes `seed_data` through `create`, in order, when the index is empty.
    ///
    /// Returns how many records were written (0 when already seeded).
    pub fn ensure_seed(&self) -> EntityResult<usize> {
        let descriptor = self.descriptor();
        if !self.index().is_empty(descriptor.index_name)? {
            return Ok(0);
        }

        let mut written = 0;
        for record in &descriptor.seed_data {
            self.create(record.clone())?;
            written += 1;
        }

        info!(
            "event=entity_seed module=entity status=ok entity={} written={}",
            descriptor.entity_name, written
        );
        Ok(written)
    }
}
