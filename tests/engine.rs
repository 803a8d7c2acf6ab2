#![forbid(unsafe_code)]
use chrono::{Duration, NaiveDate, NaiveTime};
use roulement::{
    generate, Crew, CrewMember, CrewRoster, CustomShiftTimes, EmployeeId, EngineError,
    GenerationConfig, PatternEngine, PatternName, ShiftLength, ShiftTime, ShiftType,
};
use roulement::config::ConfigError;
use std::collections::{BTreeSet, HashSet};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// A:1,2 B:3,4 C:5,6 D:7,8
fn four_crews(per_crew: u32) -> CrewRoster {
    let mut roster = CrewRoster::new();
    let mut next = 1;
    for crew in Crew::ALL {
        for _ in 0..per_crew {
            roster.add(
                crew,
                CrewMember {
                    employee_id: EmployeeId::new(next),
                    position_id: Some(100),
                },
            );
            next += 1;
        }
    }
    roster
}

fn dates_of(schedule: &roulement::Schedule, id: u32) -> BTreeSet<NaiveDate> {
    schedule
        .assignments_for(EmployeeId::new(id))
        .map(|a| a.date)
        .collect()
}

fn all_variations() -> Vec<(PatternName, String)> {
    let engine = PatternEngine::standard().unwrap();
    engine
        .catalog()
        .iter()
        .flat_map(|p| {
            p.variations
                .iter()
                .map(move |v| (p.name, v.variation.as_str().to_string()))
        })
        .collect()
}

#[test]
fn pitman_fixed_full_cycle() {
    let roster = four_crews(2);
    let config = GenerationConfig::new().with_variation("fixed");
    let schedule =
        generate("pitman", date(2024, 1, 7), date(2024, 1, 20), &roster, &config).unwrap();

    assert_eq!(schedule.assignments.len(), 56);
    assert_eq!(schedule.cycle_length, 14);
    assert!(!schedule.is_partial_cycle());

    let a_days: BTreeSet<NaiveDate> = [7, 8, 11, 12, 13, 16, 17]
        .into_iter()
        .map(|d| date(2024, 1, d))
        .collect();
    let b_days: BTreeSet<NaiveDate> = [9, 10, 14, 15, 18, 19, 20]
        .into_iter()
        .map(|d| date(2024, 1, d))
        .collect();

    assert_eq!(dates_of(&schedule, 1), a_days);
    assert_eq!(dates_of(&schedule, 2), a_days);
    assert_eq!(dates_of(&schedule, 3), b_days);
    assert_eq!(dates_of(&schedule, 5), a_days);
    assert_eq!(dates_of(&schedule, 8), b_days);

    for a in &schedule.assignments {
        match a.crew {
            Crew::A | Crew::B => {
                assert_eq!(a.shift_type, ShiftType::Day);
                assert_eq!(a.start_time, time(6, 0));
                assert_eq!(a.end_time, time(18, 0));
                assert!(!a.is_overnight());
            }
            Crew::C | Crew::D => {
                assert_eq!(a.shift_type, ShiftType::Night);
                assert_eq!(a.start_time, time(18, 0));
                assert_eq!(a.end_time, time(6, 0));
                assert!(a.is_overnight());
                assert_eq!(a.ends_at(), Some((a.date + Duration::days(1)).and_time(time(6, 0))));
            }
        }
        assert_eq!(a.hours, 12.0);
        assert_eq!(a.position_id, Some(100));
    }
}

#[test]
fn pitman_crews_a_and_b_cover_every_day() {
    let roster = four_crews(1);
    let schedule = generate(
        "pitman",
        date(2024, 1, 7),
        date(2024, 2, 3),
        &roster,
        &GenerationConfig::default(),
    )
    .unwrap();

    let a = dates_of(&schedule, 1);
    let b = dates_of(&schedule, 2);
    assert!(a.is_disjoint(&b));
    assert_eq!(a.len() + b.len(), 28);
}

#[test]
fn unknown_pattern_is_rejected() {
    let roster = four_crews(1);
    let err = generate(
        "unknown_pattern",
        date(2024, 1, 1),
        date(2024, 1, 31),
        &roster,
        &GenerationConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::UnknownPattern(_)));
    assert!(err.to_string().contains("unknown_pattern"));
}

#[test]
fn pattern_names_are_lenient() {
    assert_eq!("Southern Swing".parse::<PatternName>().unwrap(), PatternName::SouthernSwing);
    assert_eq!("four-on-four-off".parse::<PatternName>().unwrap(), PatternName::FourOnFourOff);
    assert_eq!("PITMAN".parse::<PatternName>().unwrap(), PatternName::Pitman);
    assert!("2-2-3".parse::<PatternName>().is_err());
}

#[test]
fn reversed_range_is_rejected() {
    let err = generate(
        "dupont",
        date(2024, 3, 2),
        date(2024, 3, 1),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDateRange { .. }));
}

#[test]
fn non_positive_duration_is_rejected() {
    let custom = CustomShiftTimes {
        day: Some(ShiftTime::new(time(6, 0), 0.0)),
        ..CustomShiftTimes::default()
    };
    let config = GenerationConfig::new().with_custom_times(custom);
    let err = generate("pitman", date(2024, 1, 1), date(2024, 1, 2), &four_crews(1), &config)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::InvalidDuration {
            shift: ShiftType::Day,
            ..
        })
    ));

    let negative = CustomShiftTimes {
        night: Some(ShiftTime::new(time(18, 0), -12.0)),
        ..CustomShiftTimes::default()
    };
    let config = GenerationConfig::new().with_custom_times(negative);
    assert!(
        generate("pitman", date(2024, 1, 1), date(2024, 1, 2), &four_crews(1), &config).is_err()
    );
}

#[test]
fn sub_minute_durations_are_rejected() {
    for hours in [0.001, 7.99] {
        let custom = CustomShiftTimes {
            day: Some(ShiftTime::new(time(6, 0), hours)),
            ..CustomShiftTimes::default()
        };
        let config = GenerationConfig::new().with_custom_times(custom);
        let err = generate("pitman", date(2024, 1, 7), date(2024, 1, 7), &four_crews(1), &config)
            .unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Config(ConfigError::InvalidDuration {
                    shift: ShiftType::Day,
                    ..
                })
            ),
            "{hours}"
        );
    }

    // 7h45 : minutes entières, acceptée
    let custom = CustomShiftTimes {
        day: Some(ShiftTime::new(time(6, 0), 7.75)),
        ..CustomShiftTimes::default()
    };
    let config = GenerationConfig::new().with_custom_times(custom);
    let schedule = generate("pitman", date(2024, 1, 7), date(2024, 1, 7), &four_crews(1), &config)
        .unwrap();
    let day = schedule.assignments.iter().find(|a| a.crew == Crew::A).unwrap();
    assert_eq!(day.end_time, time(13, 45));
    assert_eq!(day.duration_minutes(), 465);
}

#[test]
fn unsupported_variation_is_rejected() {
    let config = GenerationConfig::new().with_variation("rotating");
    let err = generate("dupont", date(2024, 1, 1), date(2024, 1, 28), &four_crews(1), &config)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnknownVariation {
            pattern: PatternName::Dupont,
            ..
        }
    ));

    let config = GenerationConfig::new().with_variation("sideways");
    assert!(
        generate("pitman", date(2024, 1, 1), date(2024, 1, 28), &four_crews(1), &config).is_err()
    );
}

#[test]
fn span_limit_is_enforced() {
    let config = GenerationConfig::new().with_max_span_days(31);
    let err = generate("pitman", date(2024, 1, 1), date(2024, 2, 1), &four_crews(1), &config)
        .unwrap_err();
    assert!(matches!(err, EngineError::SpanTooLong { days: 32, max: 31 }));
    assert!(
        generate("pitman", date(2024, 1, 1), date(2024, 1, 31), &four_crews(1), &config).is_ok()
    );
}

#[test]
fn generation_is_deterministic() {
    let roster = four_crews(3);
    for (pattern, variation) in all_variations() {
        let config = GenerationConfig::new().with_variation(variation);
        let first =
            generate(pattern.as_str(), date(2024, 5, 1), date(2024, 7, 31), &roster, &config)
                .unwrap();
        let second =
            generate(pattern.as_str(), date(2024, 5, 1), date(2024, 7, 31), &roster, &config)
                .unwrap();
        assert_eq!(first, second, "{pattern}");
    }
}

#[test]
fn no_employee_is_double_booked() {
    let roster = four_crews(2);
    for (pattern, variation) in all_variations() {
        let config = GenerationConfig::new().with_variation(variation.clone());
        let schedule =
            generate(pattern.as_str(), date(2024, 1, 1), date(2024, 12, 31), &roster, &config)
                .unwrap();
        let mut seen = HashSet::new();
        for a in &schedule.assignments {
            assert!(
                seen.insert((a.employee_id, a.date)),
                "{pattern}/{variation}: {} twice on {}",
                a.employee_id,
                a.date
            );
        }
    }
}

#[test]
fn work_pattern_repeats_every_cycle() {
    let roster = four_crews(1);
    let engine = PatternEngine::standard().unwrap();
    for descriptor in engine.catalog().iter() {
        let len = i64::from(descriptor.cycle_length());
        let start = date(2024, 1, 1);
        let end = start + Duration::days(2 * len - 1);
        let schedule = engine
            .generate_pattern(descriptor.name, start, end, &roster, &GenerationConfig::default())
            .unwrap();
        for id in 1..=4 {
            let worked = dates_of(&schedule, id);
            for i in 0..len {
                let day = start + Duration::days(i);
                assert_eq!(
                    worked.contains(&day),
                    worked.contains(&(day + Duration::days(len))),
                    "{} employee {id} day {i}",
                    descriptor.name
                );
            }
        }
    }
}

#[test]
fn hours_match_configured_durations() {
    let roster = four_crews(1);
    for length in [ShiftLength::TwelveHour, ShiftLength::EightHour] {
        let config = GenerationConfig::new().with_shift_length(length);
        let times = config.shift_times(length).unwrap();
        for name in PatternName::ALL {
            let schedule =
                generate(name.as_str(), date(2024, 2, 1), date(2024, 3, 31), &roster, &config)
                    .unwrap();
            for a in &schedule.assignments {
                let expected = times.get(a.shift_type);
                assert_eq!(a.hours, expected.hours);
                assert_eq!(a.start_time, expected.start);
                let (end, _) = a
                    .start_time
                    .overflowing_add_signed(Duration::minutes((a.hours * 60.0) as i64));
                assert_eq!(a.end_time, end);
            }
        }
    }
}

#[test]
fn custom_shift_times_override_the_preset() {
    let custom = CustomShiftTimes {
        day: Some(ShiftTime::parse("05:30", 10.5).unwrap()),
        ..CustomShiftTimes::default()
    };
    let config = GenerationConfig::new().with_custom_times(custom);
    let schedule = generate("pitman", date(2024, 1, 7), date(2024, 1, 7), &four_crews(1), &config)
        .unwrap();

    let day = schedule.assignments.iter().find(|a| a.crew == Crew::A).unwrap();
    assert_eq!(day.start_time, time(5, 30));
    assert_eq!(day.end_time, time(16, 0));
    assert_eq!(day.hours, 10.5);

    let night = schedule.assignments.iter().find(|a| a.crew == Crew::C).unwrap();
    assert_eq!(night.start_time, time(18, 0));
    assert_eq!(night.hours, 12.0);
}

#[test]
fn eight_hour_patterns_default_to_eight_hours() {
    let schedule = generate(
        "southern_swing",
        date(2024, 1, 1),
        date(2024, 1, 1),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap();
    // jour 0 : A de jour, B repos, C soir, D nuit
    assert_eq!(schedule.assignments.len(), 3);
    for a in &schedule.assignments {
        assert_eq!(a.hours, 8.0);
    }
    let by_crew: Vec<(Crew, ShiftType)> = schedule
        .assignments
        .iter()
        .map(|a| (a.crew, a.shift_type))
        .collect();
    assert_eq!(
        by_crew,
        vec![
            (Crew::A, ShiftType::Day),
            (Crew::C, ShiftType::Evening),
            (Crew::D, ShiftType::Night)
        ]
    );
}

#[test]
fn empty_crews_produce_nothing() {
    let mut roster = CrewRoster::new();
    roster.add(
        Crew::A,
        CrewMember {
            employee_id: EmployeeId::new(1),
            position_id: None,
        },
    );
    let schedule = generate(
        "dupont",
        date(2024, 1, 1),
        date(2024, 1, 28),
        &roster,
        &GenerationConfig::default(),
    )
    .unwrap();
    assert_eq!(schedule.assignments.len(), 14);
    assert!(schedule.assignments.iter().all(|a| a.crew == Crew::A));

    let empty = generate(
        "dupont",
        date(2024, 1, 1),
        date(2024, 1, 28),
        &CrewRoster::new(),
        &GenerationConfig::default(),
    )
    .unwrap();
    assert!(empty.assignments.is_empty());
}

#[test]
fn employees_without_crew_are_excluded() {
    let people = vec![
        roulement::Employee::new(1, Some(Crew::A), None),
        roulement::Employee::new(2, None, Some(3)),
        roulement::Employee::new(3, Some(Crew::C), None),
    ];
    let roster = CrewRoster::from_employees(&people);
    assert_eq!(roster.employee_count(), 2);

    let schedule = generate(
        "pitman",
        date(2024, 1, 7),
        date(2024, 1, 20),
        &roster,
        &GenerationConfig::default(),
    )
    .unwrap();
    assert!(schedule.assignments_for(EmployeeId::new(2)).next().is_none());
    assert_eq!(schedule.assignments.len(), 14);
}

#[test]
fn an_employee_joins_only_one_crew() {
    let mut roster = CrewRoster::new();
    let member = CrewMember {
        employee_id: EmployeeId::new(9),
        position_id: None,
    };
    assert!(roster.add(Crew::A, member));
    assert!(!roster.add(Crew::B, member));
    assert_eq!(roster.crew_of(EmployeeId::new(9)), Some(Crew::A));
    assert!(roster.members(Crew::B).is_empty());
}

#[test]
fn pitman_rotating_swaps_day_and_night_every_four_weeks() {
    let config = GenerationConfig::new().with_variation("rotating");
    let start = date(2024, 1, 7);
    let schedule = generate("pitman", start, start + Duration::days(55), &four_crews(1), &config)
        .unwrap();

    let shift_on = |id: u32, offset: i64| {
        schedule
            .assignments_for(EmployeeId::new(id))
            .find(|a| a.date == start + Duration::days(offset))
            .map(|a| a.shift_type)
    };
    assert_eq!(shift_on(1, 0), Some(ShiftType::Day));
    assert_eq!(shift_on(3, 0), Some(ShiftType::Night));
    assert_eq!(shift_on(1, 28), Some(ShiftType::Night));
    assert_eq!(shift_on(3, 28), Some(ShiftType::Day));
    assert_eq!(shift_on(2, 2), Some(ShiftType::Day));
    assert_eq!(shift_on(2, 30), Some(ShiftType::Night));
}

#[test]
fn pitman_rapid_rotates_every_four_days() {
    let config = GenerationConfig::new().with_variation("rapid");
    let start = date(2024, 1, 7);
    let schedule = generate("pitman", start, start + Duration::days(13), &four_crews(1), &config)
        .unwrap();

    let shift_on = |offset: i64| {
        schedule
            .assignments_for(EmployeeId::new(1))
            .find(|a| a.date == start + Duration::days(offset))
            .map(|a| a.shift_type)
    };
    assert_eq!(shift_on(0), Some(ShiftType::Day));
    assert_eq!(shift_on(1), Some(ShiftType::Day));
    assert_eq!(shift_on(4), Some(ShiftType::Night));
    assert_eq!(shift_on(9), Some(ShiftType::Day));
    assert_eq!(shift_on(2), None);
}

fn shift_on(schedule: &roulement::Schedule, id: u32, day: NaiveDate) -> Option<ShiftType> {
    schedule
        .assignments_for(EmployeeId::new(id))
        .find(|a| a.date == day)
        .map(|a| a.shift_type)
}

#[test]
fn fixed_fixed_weekly_sequence() {
    let start = date(2024, 1, 1);
    let schedule = generate(
        "fixed_fixed",
        start,
        start + Duration::days(6),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap();

    const D: Option<ShiftType> = Some(ShiftType::Day);
    const N: Option<ShiftType> = Some(ShiftType::Night);
    const O: Option<ShiftType> = None;
    let week = |id: u32| -> Vec<Option<ShiftType>> {
        (0..7)
            .map(|i| shift_on(&schedule, id, start + Duration::days(i)))
            .collect()
    };
    assert_eq!(week(1), vec![D, D, D, D, O, O, O]);
    assert_eq!(week(2), vec![O, O, O, D, D, D, D]);
    assert_eq!(week(3), vec![N, N, N, N, O, O, O]);
    assert_eq!(week(4), vec![O, O, O, N, N, N, N]);
}

#[test]
fn four_on_four_off_rotating_swaps_every_sixteen_days() {
    let start = date(2024, 1, 1);
    let config = GenerationConfig::new().with_variation("rotating");
    let schedule = generate(
        "four_on_four_off",
        start,
        start + Duration::days(39),
        &four_crews(1),
        &config,
    )
    .unwrap();
    let on = |id: u32, offset: i64| shift_on(&schedule, id, start + Duration::days(offset));

    // A : blocs 0-3, 8-11 de jour, 16-19, 24-27 de nuit, 32-35 de jour
    assert_eq!(on(1, 0), Some(ShiftType::Day));
    assert_eq!(on(1, 8), Some(ShiftType::Day));
    assert_eq!(on(1, 16), Some(ShiftType::Night));
    assert_eq!(on(1, 24), Some(ShiftType::Night));
    assert_eq!(on(1, 32), Some(ShiftType::Day));
    assert_eq!(on(1, 4), None);
    // B décalée de 4 jours
    assert_eq!(on(2, 4), Some(ShiftType::Day));
    assert_eq!(on(2, 12), Some(ShiftType::Day));
    assert_eq!(on(2, 20), Some(ShiftType::Night));
    assert_eq!(on(2, 36), Some(ShiftType::Day));
    assert_eq!(on(3, 0), Some(ShiftType::Night));
    assert_eq!(on(3, 16), Some(ShiftType::Day));
    assert_eq!(on(4, 4), Some(ShiftType::Night));
    assert_eq!(on(4, 20), Some(ShiftType::Day));
}

#[test]
fn four_on_four_off_rapid_follows_the_four_day_phase() {
    let start = date(2024, 1, 1);
    let config = GenerationConfig::new().with_variation("rapid");
    let schedule = generate(
        "four_on_four_off",
        start,
        start + Duration::days(23),
        &four_crews(1),
        &config,
    )
    .unwrap();
    let on = |id: u32, offset: i64| shift_on(&schedule, id, start + Duration::days(offset));

    // les blocs de travail d'une équipe tombent toujours sur la même parité
    // de période : A et D restent de jour, B et C de nuit
    for offset in [0, 3, 8, 16] {
        assert_eq!(on(1, offset), Some(ShiftType::Day), "A day {offset}");
        assert_eq!(on(3, offset), Some(ShiftType::Night), "C day {offset}");
    }
    for offset in [4, 12, 20] {
        assert_eq!(on(2, offset), Some(ShiftType::Night), "B day {offset}");
        assert_eq!(on(4, offset), Some(ShiftType::Day), "D day {offset}");
    }
    assert_eq!(on(1, 5), None);
}

#[test]
fn extreme_dates_do_not_panic() {
    for day in [NaiveDate::MIN, NaiveDate::MAX] {
        let schedule =
            generate("pitman", day, day, &four_crews(1), &GenerationConfig::default()).unwrap();
        // jour 0 : A de jour, C de nuit
        assert_eq!(schedule.assignments.len(), 2, "{day}");
        let result = schedule.validate(&roulement::ValidationOptions::default());
        assert!(result.is_valid);
    }
}

#[test]
fn five_and_two_relief_crew() {
    let schedule = generate(
        "five_and_two",
        date(2024, 1, 1),
        date(2024, 1, 7),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap();

    let crew_days = |crew: Crew| schedule.assignments.iter().filter(|a| a.crew == crew).count();
    assert_eq!(crew_days(Crew::A), 5);
    assert_eq!(crew_days(Crew::D), 5);

    let b = schedule.assignments.iter().find(|a| a.crew == Crew::B).unwrap();
    assert_eq!(b.shift_type, ShiftType::Evening);
    assert_eq!(b.start_time, time(15, 0));

    // week-end du cycle : seule la relève travaille
    let last_two: Vec<Crew> = schedule
        .assignments
        .iter()
        .filter(|a| a.date >= date(2024, 1, 6))
        .map(|a| a.crew)
        .collect();
    assert_eq!(last_two, vec![Crew::D, Crew::D]);
}

#[test]
fn weekly_hours_above_forty_are_flagged_overtime() {
    // A (id 1) travaille lun. 8, jeu. 11, ven. 12, sam. 13 janvier : 48h
    let schedule = generate(
        "pitman",
        date(2024, 1, 7),
        date(2024, 1, 20),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap();
    let flagged: Vec<NaiveDate> = schedule
        .assignments_for(EmployeeId::new(1))
        .filter(|a| a.is_overtime)
        .map(|a| a.date)
        .collect();
    assert_eq!(flagged, vec![date(2024, 1, 13)]);
}

#[test]
fn short_range_is_a_partial_cycle() {
    let schedule = generate(
        "dupont",
        date(2024, 1, 1),
        date(2024, 1, 10),
        &four_crews(1),
        &GenerationConfig::default(),
    )
    .unwrap();
    assert!(schedule.is_partial_cycle());
    assert_eq!(schedule.span_days(), 10);
}

#[test]
fn standard_catalog_is_complete() {
    let engine = PatternEngine::standard().unwrap();
    let catalog = engine.catalog();
    assert_eq!(catalog.len(), 8);
    let cycles: Vec<(PatternName, u32)> = catalog
        .iter()
        .map(|p| (p.name, p.cycle_length()))
        .collect();
    assert_eq!(
        cycles,
        vec![
            (PatternName::Pitman, 14),
            (PatternName::Dupont, 28),
            (PatternName::SouthernSwing, 28),
            (PatternName::FixedFixed, 7),
            (PatternName::FiveAndTwo, 7),
            (PatternName::FourOnFourOff, 8),
            (PatternName::Panama, 28),
            (PatternName::Continental, 28),
        ]
    );
    for p in catalog.iter() {
        p.validate().unwrap();
    }
}

#[test]
fn malformed_sequence_is_refused() {
    use roulement::pattern::{PatternDescriptor, VariationRule};
    let bad = PatternDescriptor::parse(
        PatternName::Pitman,
        "11X0",
        [0, 0, 0, 0],
        None,
        vec![VariationRule::fixed()],
        ShiftLength::TwelveHour,
    );
    assert!(bad.is_err());

    // drapeaux 1/0 sans table d'équipe
    let no_table = PatternDescriptor::parse(
        PatternName::Pitman,
        "1100",
        [0, 0, 0, 0],
        None,
        vec![VariationRule::fixed()],
        ShiftLength::TwelveHour,
    );
    assert!(no_table.is_err());
}
