//! Departure delays that make every UAV meet the airliner on time.

use crate::airplane::Airplane;
use crate::error::{LookupError, ScheduleError};
use crate::tags;
use std::collections::BTreeMap;

/// Delay each UAV so that it reaches its docking point together with the
/// airliner, which flies through a waypoint with the same tag.
///
/// The delay is the difference between the two undelayed travel times; a
/// UAV that cannot arrive early enough fails with [`ScheduleError::NegativeDelay`].
pub fn delay_uavs(airliner: &Airplane, uavs: &mut [Airplane]) -> crate::Result<()> {
    let airliner_times = airliner.travel_durations_to_tagged_waypoints()?;
    for uav in uavs.iter_mut() {
        let tag = tags::docking_point(&uav.id);
        let airliner_s = time_at(&airliner_times, &airliner.id, &tag)?;
        let uav_s = time_at(&uav.travel_durations_to_tagged_waypoints()?, &uav.id, &tag)?;

        let delay_s = airliner_s - uav_s;
        if delay_s < 0.0 {
            return Err(ScheduleError::NegativeDelay {
                uav: uav.id.clone(),
                tag,
                uav_s,
                airliner_s,
            }
            .into());
        }
        uav.delay_departure(delay_s)?;
        tracing::info!(
            "{} departs at {:.1} s to meet {} after {:.1} s",
            uav.id,
            delay_s,
            airliner.id,
            airliner_s
        );
    }
    Ok(())
}

fn time_at(times: &BTreeMap<String, f64>, airplane: &str, tag: &str) -> Result<f64, LookupError> {
    times.get(tag).copied().ok_or_else(|| LookupError::NotFound {
        airplane: airplane.to_string(),
        tag: tag.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airplane::{AirplaneKind, AirplaneSpec, CargoTank};
    use crate::error::Error;
    use crate::geometry::Location;
    use crate::models::Waypoint;

    fn plane(id: &str, kind: AirplaneKind, points: &[(f64, Option<&str>)], speed: f64) -> Airplane {
        let waypoints = points
            .iter()
            .map(|(x, tag)| {
                let mut w = Waypoint::new(Location::new(*x, 0.0, 10.0), speed);
                if let Some(tag) = tag {
                    w.set_tag(*tag);
                }
                w
            })
            .collect();
        Airplane::new(id, AirplaneSpec::uav(), kind, 100.0, waypoints).unwrap()
    }

    fn uav(points: &[(f64, Option<&str>)]) -> Airplane {
        plane(
            "PIT_UAV_0",
            AirplaneKind::Uav {
                cargo: CargoTank {
                    capacity_mj: 1000.0,
                    level_pc: 100.0,
                },
            },
            points,
            360.0,
        )
    }

    fn airliner() -> Airplane {
        plane(
            "Airliner",
            AirplaneKind::Airliner { docked_uav: None },
            &[(0.0, None), (50.0, Some("PIT_UAV_0_on_airliner_docking_point")), (60.0, None)],
            720.0,
        )
    }

    #[test]
    fn test_uav_meets_airliner_exactly() {
        let airliner = airliner();
        let mut uavs = vec![uav(&[
            (30.0, None),
            (40.0, None),
            (50.0, Some("PIT_UAV_0_on_airliner_docking_point")),
        ])];
        delay_uavs(&airliner, &mut uavs).unwrap();
        // airliner needs 250 s, UAV 200 s
        let planned = uavs[0].elapsed_time_at_tagged_waypoints().unwrap();
        let airliner_times = airliner.elapsed_time_at_tagged_waypoints().unwrap();
        let tag = "PIT_UAV_0_on_airliner_docking_point";
        assert!((planned[tag] - airliner_times[tag]).abs() < 1e-9);
        assert_eq!(uavs[0].waypoints()[0].time_into_simulation_s, Some(50.0));
    }

    #[test]
    fn test_uav_too_far_away_is_rejected() {
        let airliner = airliner();
        let mut uavs = vec![uav(&[
            (-100.0, None),
            (50.0, Some("PIT_UAV_0_on_airliner_docking_point")),
        ])];
        let result = delay_uavs(&airliner, &mut uavs);
        assert!(matches!(
            result,
            Err(Error::Schedule(ScheduleError::NegativeDelay { .. }))
        ));
    }

    #[test]
    fn test_missing_docking_tag_is_reported() {
        let airliner = airliner();
        let mut uavs = vec![uav(&[(0.0, None), (10.0, None)])];
        assert!(matches!(
            delay_uavs(&airliner, &mut uavs),
            Err(Error::Lookup(_))
        ));
    }
}
