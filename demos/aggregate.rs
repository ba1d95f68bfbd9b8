//! Score a synthetic organization with both strategies

use threatscore::{MeanAggregator, ThreatScoreGenerator, VarianceAggregator};

fn main() {
    let mut generator = ThreatScoreGenerator::new();

    match generator
        .random_departments()
        .and_then(|org| VarianceAggregator::aggregate(&org))
    {
        Ok(score) => println!("Aggregated variance threat score: {score:.2}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }

    match generator
        .random_weighted_departments()
        .and_then(|departments| MeanAggregator::new().aggregate(&departments))
    {
        Ok(score) => println!("Aggregated cybersecurity threat score: {score:.2}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
