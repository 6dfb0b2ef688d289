use speculate2::speculate;
use stackgen::config::{
    default_database_name, validate_database_name, validate_project_name, DatabaseConfig,
    ProjectConfig, ProjectManifest, ValidationError,
};

fn sample_project() -> ProjectConfig {
    ProjectConfig {
        project_name: "my-shop".to_string(),
        database: DatabaseConfig {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: "secret".to_string(),
            name: "my_shop_db".to_string(),
        },
    }
}

speculate! {
    describe "project name validation" {
        it "accepts lowercase names with digits and dashes" {
            assert!(validate_project_name("my-project-2").is_ok());
        }

        it "rejects empty names" {
            assert_eq!(validate_project_name(""), Err(ValidationError::EmptyName));
        }

        it "rejects uppercase and special characters" {
            assert_eq!(
                validate_project_name("MyProject"),
                Err(ValidationError::InvalidNameChars)
            );
            assert_eq!(
                validate_project_name("my_project"),
                Err(ValidationError::InvalidNameChars)
            );
        }

        it "rejects names shorter than three characters" {
            assert_eq!(validate_project_name("ab"), Err(ValidationError::NameTooShort));
        }
    }

    describe "database name validation" {
        it "accepts lowercase names with underscores" {
            assert!(validate_database_name("my_shop_db").is_ok());
        }

        it "rejects dashes" {
            assert_eq!(
                validate_database_name("my-shop-db"),
                Err(ValidationError::InvalidDatabaseNameChars)
            );
        }

        it "rejects empty names" {
            assert_eq!(validate_database_name(""), Err(ValidationError::EmptyDatabaseName));
        }

        it "derives the default from the project name" {
            assert_eq!(default_database_name("my-shop"), "my_shop_db");
            assert_eq!(default_database_name("blog"), "blog_db");
        }
    }

    describe "project layout" {
        it "derives the service directory names" {
            let project = sample_project();
            assert_eq!(project.backend_dir_name(), "my-shop-backend");
            assert_eq!(project.frontend_dir_name(), "my-shop-frontend");
        }
    }

    describe "project manifest" {
        before {
            let dir = tempfile::tempdir().expect("tempdir");
        }

        it "round-trips through stackgen.json" {
            let manifest = ProjectManifest::for_project(&sample_project());
            manifest.store(dir.path()).expect("store manifest");

            let loaded = ProjectManifest::load(dir.path()).expect("load manifest");
            assert_eq!(loaded.project_name, "my-shop");
            assert_eq!(loaded.database, "my_shop_db");
            assert_eq!(loaded.backend_dir, "my-shop-backend");
            assert_eq!(loaded.frontend_dir, "my-shop-frontend");
        }

        it "never persists credentials" {
            let manifest = ProjectManifest::for_project(&sample_project());
            manifest.store(dir.path()).expect("store manifest");

            let raw = std::fs::read_to_string(dir.path().join("stackgen.json")).expect("read");
            assert!(!raw.contains("secret"));
            assert!(!raw.contains("root"));
        }

        it "fills in marker defaults for manifests written before markers were configurable" {
            let raw = r#"{
                "project_name": "my-shop",
                "database": "my_shop_db",
                "backend_dir": "my-shop-backend",
                "frontend_dir": "my-shop-frontend"
            }"#;
            std::fs::write(dir.path().join("stackgen.json"), raw).expect("write");

            let loaded = ProjectManifest::load(dir.path()).expect("load manifest");
            assert_eq!(loaded.backend_ready_marker, "started");
            assert_eq!(loaded.frontend_ready_marker, "compiled successfully");
        }

        it "reports a missing manifest with its expected path" {
            let err = ProjectManifest::load(dir.path()).expect_err("no manifest yet");
            assert!(err.to_string().contains("stackgen.json"));
        }
    }
}
