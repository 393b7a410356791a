use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;

/// Moves output fields to their new names once everything else has run.
///
/// Pairs are applied independently, so `a → b, b → c` moves `a` to `b`
/// and the original `b` to `c`. A record without an old name is left as it
/// is for that pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renames;

impl Stage for Renames {
    fn name(&self) -> &'static str {
        "renames"
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let renames = &assembly.level.spec.renames;
        if renames.is_empty() {
            return Ok(());
        }
        for record in assembly.results.records_mut() {
            let moved: Vec<_> = renames
                .iter()
                .filter_map(|(from, to)| record.remove(from).map(|field| (to.clone(), field)))
                .collect();
            for (to, field) in moved {
                record.insert(to, field);
            }
        }
        Ok(())
    }
}
