#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::services::ActivityStatsService;
    use crate::stores::ActivityStore;
    use crate::tenant;
    use crate::test::utils::{create_test_company, create_test_user, setup_test_stores};
    use crate::types::db::{company, user};
    use crate::types::internal::{ActivityType, NewActivity};

    async fn record(
        store: &ActivityStore,
        company: &company::Model,
        user: &user::Model,
        activity_type: ActivityType,
        age: Duration,
    ) -> crate::types::db::activity::Model {
        tenant::with_tenant(
            company.id,
            store.create(NewActivity {
                user_id: user.id,
                company_id: company.id,
                activity_type,
                metadata: Default::default(),
                occurred_at: Some(Utc::now() - age),
            }),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn builds_the_full_bundle() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let alice = create_test_user(&user_store, company.id, "alice@techcorp.com").await;
        let bob = create_test_user(&user_store, company.id, "bob@techcorp.com").await;

        // Moments ago: both users active today
        record(&activity_store, &company, &alice, ActivityType::Login, Duration::seconds(1)).await;
        record(&activity_store, &company, &alice, ActivityType::GiveRecognition, Duration::seconds(2)).await;
        record(&activity_store, &company, &bob, ActivityType::Login, Duration::seconds(3)).await;
        // Earlier this week: alice only
        record(&activity_store, &company, &alice, ActivityType::Logout, Duration::days(3)).await;
        // Outside every trailing window except the all-time totals
        record(&activity_store, &company, &alice, ActivityType::AdminAction, Duration::days(30)).await;

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        assert_eq!(report.overview.total_activities, 5);
        assert_eq!(report.overview.activities_today, 3);
        assert_eq!(report.overview.active_users_today, 2);
        assert_eq!(report.overview.activities_this_week, 4);

        assert_eq!(report.activity_breakdown.get("login"), Some(&2));
        assert_eq!(report.activity_breakdown.get("give_recognition"), Some(&1));
        assert_eq!(report.activity_breakdown.get("admin_action"), Some(&1));

        assert_eq!(report.user_stats.total_users, 2);
        assert_eq!(report.user_stats.active_users_this_week, 2);
    }

    #[tokio::test]
    async fn recent_activities_are_newest_first_and_capped_at_ten() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let user = create_test_user(&user_store, company.id, "user@techcorp.com").await;

        for minutes in 1..=12 {
            record(
                &activity_store,
                &company,
                &user,
                ActivityType::Login,
                Duration::minutes(minutes),
            )
            .await;
        }

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        assert_eq!(report.recent_activities.len(), 10);
        let stamps: Vec<_> = report
            .recent_activities
            .iter()
            .map(|a| a.occurred_at)
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(stamps, sorted, "recent activities should be newest first");
    }

    #[tokio::test]
    async fn ranks_the_most_active_users_with_at_most_five_entries() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;

        let mut users = Vec::new();
        for i in 0..7 {
            users.push(
                create_test_user(&user_store, company.id, &format!("user{i}@techcorp.com")).await,
            );
        }

        // user i gets i+1 activities, so user 6 is the most active
        for (i, user) in users.iter().enumerate() {
            for _ in 0..=i {
                record(&activity_store, &company, user, ActivityType::Login, Duration::minutes(1))
                    .await;
            }
        }

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        let ranked = &report.user_stats.most_active_users;
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].id, users[6].id);
        assert_eq!(ranked[0].activity_count, 7);
        assert!(ranked.windows(2).all(|w| w[0].activity_count >= w[1].activity_count));
    }

    #[tokio::test]
    async fn trend_buckets_are_keyed_by_day_and_type() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let user = create_test_user(&user_store, company.id, "user@techcorp.com").await;

        let first =
            record(&activity_store, &company, &user, ActivityType::Login, Duration::hours(1)).await;
        let second =
            record(&activity_store, &company, &user, ActivityType::Login, Duration::hours(2)).await;
        let old =
            record(&activity_store, &company, &user, ActivityType::Logout, Duration::days(2)).await;

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        // Expected buckets derive from the stored timestamps themselves,
        // so the assertion holds whichever side of midnight the test runs on
        let mut expected: std::collections::BTreeMap<
            chrono::NaiveDate,
            std::collections::BTreeMap<String, u64>,
        > = Default::default();
        for stored in [&first, &second, &old] {
            *expected
                .entry(stored.occurred_at.date_naive())
                .or_default()
                .entry(stored.activity_type.clone())
                .or_insert(0) += 1;
        }
        assert_eq!(report.activity_trends, expected);
    }

    #[tokio::test]
    async fn peak_times_are_sorted_by_hour_ascending() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let user = create_test_user(&user_store, company.id, "user@techcorp.com").await;

        for hours in [1, 5, 9, 13] {
            record(&activity_store, &company, &user, ActivityType::Login, Duration::hours(hours))
                .await;
        }

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        assert!(!report.peak_times.is_empty());
        assert!(report
            .peak_times
            .windows(2)
            .all(|w| w[0].hour < w[1].hour));
        assert!(report.peak_times.iter().all(|h| h.hour <= 23));
        assert_eq!(report.peak_times.iter().map(|h| h.count).sum::<u64>(), 4);
    }

    #[tokio::test]
    async fn discarded_users_leave_totals_but_keep_their_history_counted() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let keeper = create_test_user(&user_store, company.id, "keeper@techcorp.com").await;
        let former = create_test_user(&user_store, company.id, "former@techcorp.com").await;

        record(&activity_store, &company, &keeper, ActivityType::Login, Duration::minutes(1)).await;
        record(&activity_store, &company, &former, ActivityType::Login, Duration::minutes(2)).await;

        user_store.discard(former.id).await.unwrap();

        let service = ActivityStatsService::new(user_store.clone(), activity_store.clone());
        let report = service.generate(&company).await.unwrap();

        assert_eq!(report.user_stats.total_users, 1);
        // History is never orphaned: the discarded user's events still count
        assert_eq!(report.overview.total_activities, 2);
        assert_eq!(report.user_stats.active_users_this_week, 2);
    }
}
