#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::errors::internal::{EntityError, ValidationError};
    use crate::errors::InternalError;
    use crate::tenant;
    use crate::test::utils::{create_test_company, create_test_user, setup_test_stores};
    use crate::types::internal::{ActivityType, NewActivity};

    #[tokio::test]
    async fn creates_with_tracking_enabled_by_default_shape() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;

        let company = company_store.create("TechCorp", true, None).await.unwrap();
        assert!(company.tracking_enabled);
        assert!(company.tracking_config.is_none());
        assert_eq!(company.retention_days(), None);
    }

    #[tokio::test]
    async fn keeps_the_tracking_config_as_written() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;

        let company = company_store
            .create(
                "StartupInc",
                true,
                Some(json!({
                    "enabled_activity_types": ["login"],
                    "retention_days": 365,
                })),
            )
            .await
            .unwrap();

        assert_eq!(company.retention_days(), Some(365));
        assert!(company.tracking_enabled_for("login"));
        assert!(!company.tracking_enabled_for("logout"));
    }

    #[tokio::test]
    async fn rejects_blank_and_duplicate_names() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;

        let error = company_store.create("  ", true, None).await.unwrap_err();
        assert!(matches!(
            error,
            InternalError::Validation(ValidationError::BlankName)
        ));

        company_store.create("TechCorp", true, None).await.unwrap();
        let error = company_store.create("TechCorp", true, None).await.unwrap_err();
        assert!(matches!(
            error,
            InternalError::Validation(ValidationError::CompanyNameTaken(_))
        ));
    }

    #[tokio::test]
    async fn update_tracking_replaces_flag_and_config() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        assert!(company.tracking_enabled_for("login"));

        let updated = company_store
            .update_tracking(company.id, false, None)
            .await
            .unwrap();
        assert!(!updated.tracking_enabled_for("login"));

        let updated = company_store
            .update_tracking(
                company.id,
                true,
                Some(json!({ "enabled_activity_types": ["logout"] })),
            )
            .await
            .unwrap();
        assert!(updated.tracking_enabled_for("logout"));
        assert!(!updated.tracking_enabled_for("login"));
    }

    #[tokio::test]
    async fn delete_refuses_while_users_exist() {
        let (_db, company_store, user_store, _activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        create_test_user(&user_store, company.id, "user@techcorp.com").await;

        let error = company_store.delete(company.id).await.unwrap_err();
        assert!(matches!(
            error,
            InternalError::Entity(EntityError::HasDependents {
                dependents: "users",
                ..
            })
        ));
        assert!(company_store.find_by_id(company.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_refuses_while_activities_exist_even_without_kept_users() {
        let (_db, company_store, user_store, activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "TechCorp").await;
        let user = create_test_user(&user_store, company.id, "user@techcorp.com").await;

        tenant::with_tenant(
            company.id,
            activity_store.create(NewActivity {
                user_id: user.id,
                company_id: company.id,
                activity_type: ActivityType::Login,
                metadata: Default::default(),
                occurred_at: None,
            }),
        )
        .await
        .unwrap();

        let error = company_store.delete(company.id).await.unwrap_err();
        assert!(matches!(
            error,
            InternalError::Entity(EntityError::HasDependents { .. })
        ));
    }

    #[tokio::test]
    async fn deletes_a_company_with_no_dependents() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;
        let company = create_test_company(&company_store, "Standalone").await;

        company_store.delete(company.id).await.unwrap();
        assert!(company_store.find_by_id(company.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finds_by_name() {
        let (_db, company_store, _user_store, _activity_store) = setup_test_stores().await;
        create_test_company(&company_store, "TechCorp").await;

        assert!(company_store.find_by_name("TechCorp").await.unwrap().is_some());
        assert!(company_store.find_by_name("NoSuchCo").await.unwrap().is_none());
    }
}
