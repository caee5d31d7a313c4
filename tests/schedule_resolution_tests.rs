use chrono::Duration;
use season_calendar::testing_utils::{TestResolverBuilder, known_resolutions, utc};
use season_calendar::{AppError, Convention, ScheduleIdentity, Season, format_period_or_unavailable};
use tempfile::tempdir;

#[test]
fn test_known_resolutions() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    for case in known_resolutions() {
        let identity = resolver.resolve(case.instant, case.convention).unwrap();
        assert_eq!(
            (identity.year, identity.season, identity.week),
            (case.year, case.season, case.week),
            "{} under {}",
            case.instant,
            case.convention
        );
        assert!(identity.window.contains(case.instant));
    }
}

#[test]
fn test_spring_to_summer_boundary_airing_periods() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    let before = resolver
        .resolve(utc(2025, 6, 26, 14, 0, 0), Convention::Episode)
        .unwrap();
    assert_eq!(before.airing_period(), "Airing Period: June, 20 - June, 26");

    let after = resolver
        .resolve(utc(2025, 6, 27, 14, 0, 0), Convention::Episode)
        .unwrap();
    assert_eq!(after.airing_period(), "Airing Period: June, 27 - July, 03");
}

#[test]
fn test_winter_rollover_2025_to_2026() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    let winter = resolver.window_for(2026, 1, 1, Convention::Episode).unwrap();
    assert_eq!(winter.start, utc(2025, 12, 26, 0, 0, 0));

    let last_fall = resolver
        .resolve(winter.start - Duration::microseconds(1), Convention::Episode)
        .unwrap();
    assert_eq!(
        (last_fall.year, last_fall.season, last_fall.week),
        (2025, Season::Fall, 13)
    );
    assert_eq!(last_fall.window.end + Duration::microseconds(1), winter.start);
}

#[test]
fn test_every_episode_window_round_trips() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    for year in [2024, 2025] {
        let windows = resolver.windows_for_year(year, Convention::Episode).unwrap();
        assert_eq!(windows.len(), 52);
        for window in windows {
            let expected = ScheduleIdentity::from_window(window);
            let midpoint = window.start + window.span() / 2;
            for instant in [window.start, midpoint, window.end] {
                assert_eq!(
                    resolver.resolve(instant, Convention::Episode).unwrap(),
                    expected,
                    "{instant}"
                );
            }

            let by_key = resolver
                .window_for(year, window.season.index() as i64, window.week as i64, Convention::Episode)
                .unwrap();
            assert_eq!(by_key, window);
        }
    }
}

#[test]
fn test_post_windows_round_trip_with_latest_start_winning() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    let windows = resolver.windows_for_year(2025, Convention::Post).unwrap();
    for (i, window) in windows.iter().enumerate() {
        let at_start = resolver.resolve(window.start, Convention::Post).unwrap();
        assert_eq!(at_start.window, *window);

        let at_end = resolver.resolve(window.end, Convention::Post).unwrap();
        match windows.get(i + 1) {
            // The following week already started (spring forward overlap)
            Some(next) if next.start <= window.end => assert_eq!(at_end.window, *next),
            _ => assert_eq!(at_end.window, *window),
        }
    }
}

#[test]
fn test_post_week_across_spring_forward() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    // 2025-03-09 is the spring forward Sunday in New York
    let week_10 = resolver.window_for(2025, 1, 10, Convention::Post).unwrap();
    let week_11 = resolver.window_for(2025, 1, 11, Convention::Post).unwrap();
    assert_eq!(week_10.start, utc(2025, 3, 2, 8, 0, 0));
    assert_eq!(week_10.end, utc(2025, 3, 9, 7, 59, 59));
    assert_eq!(week_11.start, utc(2025, 3, 9, 7, 0, 0));

    let inside_overlap = resolver
        .resolve(utc(2025, 3, 9, 7, 30, 0), Convention::Post)
        .unwrap();
    assert_eq!(inside_overlap.week, 11);

    let before_overlap = resolver
        .resolve(utc(2025, 3, 9, 6, 59, 59), Convention::Post)
        .unwrap();
    assert_eq!(before_overlap.week, 10);
}

#[test]
fn test_post_fall_back_gap_is_not_guessed() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    // 2025-11-02 is the fall back Sunday in New York
    let week_5 = resolver.window_for(2025, 4, 5, Convention::Post).unwrap();
    let week_6 = resolver.window_for(2025, 4, 6, Convention::Post).unwrap();
    assert_eq!(week_5.end, utc(2025, 11, 2, 6, 59, 59));
    assert_eq!(week_6.start, utc(2025, 11, 2, 8, 0, 0));

    let gap = utc(2025, 11, 2, 7, 30, 0);
    let err = resolver.resolve(gap, Convention::Post).unwrap_err();
    assert!(matches!(
        err,
        AppError::ScheduleNotFound {
            convention: Convention::Post,
            ..
        }
    ));
    assert!(err.is_not_found());
    assert_eq!(
        format_period_or_unavailable(resolver.resolve(gap, Convention::Post).ok().as_ref().map(|identity| &identity.window)),
        "Airing Period: unavailable"
    );

    // The episode convention has no such gap
    let episode = resolver.resolve(gap, Convention::Episode).unwrap();
    assert_eq!((episode.season, episode.week), (Season::Fall, 6));
}

#[test]
fn test_window_for_caller_errors_leave_cache_untouched() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .build()
        .unwrap();

    for (season, week) in [(0, 1), (5, 1), (1, 0), (1, 14), (-1, 3), (2, -13)] {
        let err = resolver
            .window_for(2025, season, week, Convention::Episode)
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidWeekOrSeason { season: s, week: w } if s == season && w == week)
        );
        assert!(err.is_caller_error());
    }
    assert!(resolver.store().cache_info().unwrap().is_empty());

    let window = resolver.window_for(2025, 4, 13, Convention::Episode).unwrap();
    assert_eq!((window.season, window.week), (Season::Fall, 13));
    assert_eq!(window.start, utc(2025, 12, 19, 0, 0, 0));
}

#[test]
fn test_current_follows_injected_clock() {
    let dir = tempdir().unwrap();
    let resolver = TestResolverBuilder::new(dir.path().join("schedules.sqlite"))
        .at(utc(2025, 6, 29, 13, 0, 0))
        .build()
        .unwrap();

    let post = resolver.current(Convention::Post).unwrap();
    assert_eq!((post.year, post.season, post.week), (2025, Season::Summer, 1));

    let episode = resolver.current(Convention::Episode).unwrap();
    assert_eq!(
        (episode.year, episode.season, episode.week),
        (2025, Season::Summer, 1)
    );
}
