use crate::catalog::SubjectId;
use crate::error::{EngineError, Result};

/// A named measurable attribute of a unit (e.g. "TotalPopulation").
///
/// May declare a `percentage_denominator`: another subject whose aggregate
/// becomes the divisor when this subject is presented as a ratio.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub percentage_denominator: Option<SubjectId>,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>, percentage_denominator: Option<SubjectId>) -> Self {
        Self { id, name: name.into(), percentage_denominator }
    }
}

/// Topologically sort `subjects` so that any subject serving as a
/// percentage denominator is processed before subjects that reference it.
///
/// Grounded in spec §3's acyclicity invariant on the denominator graph and
/// §4.E's "process denominators before dependents" ordering rule, which
/// §9's Open Questions section says must be followed everywhere (including
/// inside `combine`), not just in `delta`.
pub fn denominator_order(subjects: &[Subject]) -> Result<Vec<SubjectId>> {
    let n = subjects.len();
    let index_of = |id: SubjectId| subjects.iter().position(|s| s.id == id);

    #[derive(Clone, Copy, PartialEq)]
    enum Mark { Unvisited, InProgress, Done }

    let mut marks = vec![Mark::Unvisited; n];
    let mut order = Vec::with_capacity(n);

    fn visit(
        i: usize,
        subjects: &[Subject],
        index_of: &impl Fn(SubjectId) -> Option<usize>,
        marks: &mut [Mark],
        order: &mut Vec<SubjectId>,
    ) -> Result<()> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                return Err(EngineError::InvariantViolation(format!(
                    "denominator graph has a cycle at subject '{}'",
                    subjects[i].name
                )));
            }
            Mark::Unvisited => {}
        }
        marks[i] = Mark::InProgress;
        if let Some(denom) = subjects[i].percentage_denominator {
            if let Some(j) = index_of(denom) {
                visit(j, subjects, index_of, marks, order)?;
            }
        }
        marks[i] = Mark::Done;
        order.push(subjects[i].id);
        Ok(())
    }

    for i in 0..n {
        visit(i, subjects, &index_of, &mut marks, &mut order)?;
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(id: u32, name: &str, denom: Option<u32>) -> Subject {
        Subject::new(SubjectId(id), name, denom.map(SubjectId))
    }

    #[test]
    fn independent_subjects_keep_their_relative_order() {
        let subjects = vec![s(0, "totpop", None), s(1, "vap", None)];
        let order = denominator_order(&subjects).unwrap();
        assert_eq!(order, vec![SubjectId(0), SubjectId(1)]);
    }

    #[test]
    fn denominator_precedes_dependent() {
        // black_vap depends on vap, which is declared after it in the input.
        let subjects = vec![s(0, "black_vap", Some(1)), s(1, "vap", None)];
        let order = denominator_order(&subjects).unwrap();
        assert_eq!(order, vec![SubjectId(1), SubjectId(0)]);
    }

    #[test]
    fn cycle_is_rejected() {
        let subjects = vec![s(0, "a", Some(1)), s(1, "b", Some(0))];
        assert!(denominator_order(&subjects).is_err());
    }
}
