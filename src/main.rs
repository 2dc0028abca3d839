use std::env;

use log::info;

use curves::configuration::CurveConfiguration;
use curves::curve::curve::{
    CoefficientCurve,
    Curve
};
use curves::curve::curveerror::CurveError;
use curves::curve::discretese3curve::DiscreteSE3Curve;
use curves::curve::policy::samplingpolicy::SamplingPolicy;
use curves::io::curveio::load_curve_times_and_values;
use curves::math::se3::SE3;

/// usage: curves <config.json> <poses.txt> <output.txt>
///
/// Streams every pose of `poses.txt` (rows of `time, x, y, z, qw, qx, qy, qz`)
/// through a sampled SE3 curve and writes the resulting coefficients.
fn main() -> Result<(), CurveError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        return Err(CurveError::PreconditionViolation(
            "usage: curves <config.json> <poses.txt> <output.txt>".to_owned()
        ));
    }

    let config = CurveConfiguration::from_reader(&args[1])?;
    let policy = SamplingPolicy::from_config(config.sampling())?;
    let mut curve = DiscreteSE3Curve::with_policy(policy);

    let (times, poses): (Vec<i64>, Vec<SE3>) = load_curve_times_and_values(&args[2])?;
    info!("streaming {} poses", times.len());
    for (time, pose) in times.iter().zip(poses.iter()) {
        curve.extend(&[*time], &[*pose])?;
    }

    curve.save_curve_times_and_values(&args[3])?;
    println!("{}", curve);
    if let (Some(min_time), Some(max_time)) = (curve.min_time(), curve.max_time()) {
        println!("twist at {}: {:?}", max_time, curve.evaluate_twist_a(max_time).ok());
        println!("pose at {}: {}", min_time, curve.evaluate(min_time)?);
    }
    Ok(())
}
