use rand::Rng;

use crate::LabelledTransitionSystem;
use crate::LtsBuilder;

/// Generates a monolithic LTS with the desired number of states, labels and
/// maximum out degree. The payload of every state is its own index.
pub fn random_lts(num_of_states: usize, num_of_labels: u32, outdegree: usize) -> LabelledTransitionSystem<usize> {
    // Introduce lower case letters for the labels.
    let labels: Vec<String> = (0..num_of_labels)
        .map(|i| char::from_digit(i + 10, 36).map_or_else(|| format!("l{i}"), |c| c.to_string()))
        .collect();

    let mut builder = LtsBuilder::new(labels);
    for state in 0..num_of_states {
        builder.insert_state(state);
    }

    let mut rng = rand::rng();
    for from in 0..num_of_states {
        // Introduce outgoing transitions for this state based on the desired out degree.
        for _ in 0..rng.random_range(0..outdegree.max(1)) {
            // Pick a random label and state.
            let label = rng.random_range(0..num_of_labels.max(1)) as usize;
            let to = rng.random_range(0..num_of_states);

            builder.add_transition(from, label, to);
        }
    }

    builder.finish(0)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_random_lts() {
        let lts = random_lts(10, 3, 3);
        assert_eq!(lts.num_of_states(), 10);
        assert!(lts.num_of_transitions() <= 20);
    }
}
