//! Angular frontend scaffolding.
//!
//! `ng new` builds the tree; afterwards the environment files are pointed
//! at the backend API, a typed API service is added, and the default app
//! shell is replaced with a welcome dashboard that exercises the status
//! endpoints the backend scaffold exposes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::fs;

use crate::config::ProjectConfig;
use crate::ui;

use super::{run_quiet, run_step};

/// Create and configure the Angular project under `frontend_path`.
pub async fn setup_frontend(frontend_path: &Path, config: &ProjectConfig) -> Result<()> {
    let Some(dir_name) = frontend_path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        bail!("frontend path {} has no directory name", frontend_path.display());
    };

    ui::step("Creating Angular project (ng new)");
    run_step(
        "ng new",
        frontend_path.parent(),
        "ng",
        &[
            "new",
            &dir_name,
            "--directory",
            &dir_name,
            "--routing=true",
            "--style=css",
            "--skip-git=true",
        ],
    )
    .await?;

    let pb = ui::spinner("Configuring Angular...");
    write_environments(frontend_path, config).await?;
    write_api_service(frontend_path).await?;

    pb.set_message("Generating welcome component...");
    if !run_quiet(
        frontend_path,
        "ng",
        &["generate", "component", "welcome", "--skip-tests=true"],
    )
    .await?
    {
        pb.suspend(|| ui::warn("ng generate failed; writing the welcome component from scratch"));
    }
    write_welcome_component(frontend_path, config).await?;
    write_app_shell(frontend_path).await?;
    pb.finish_and_clear();

    ui::success("Angular frontend configured");
    Ok(())
}

/// `environment.ts` / `environment.prod.ts` carrying the API URL and the
/// project identity the welcome dashboard displays.
async fn write_environments(frontend_path: &Path, config: &ProjectConfig) -> Result<()> {
    let dir = frontend_path.join("src").join("environments");
    fs::create_dir_all(&dir).await?;

    fs::write(dir.join("environment.ts"), environment_template(false, config))
        .await
        .context("could not write environment.ts")?;
    fs::write(
        dir.join("environment.prod.ts"),
        environment_template(true, config),
    )
    .await
    .context("could not write environment.prod.ts")?;
    Ok(())
}

fn environment_template(production: bool, config: &ProjectConfig) -> String {
    format!(
        "export const environment = {{
  production: {production},
  apiUrl: 'http://localhost:8000/api',
  projectName: '{name}',
  database: '{database}'
}};
",
        name = config.project_name,
        database = config.database.name,
    )
}

async fn write_api_service(frontend_path: &Path) -> Result<()> {
    let dir = frontend_path.join("src").join("app").join("services");
    fs::create_dir_all(&dir).await?;
    fs::write(dir.join("api.service.ts"), API_SERVICE)
        .await
        .context("could not write api.service.ts")?;
    Ok(())
}

async fn write_welcome_component(frontend_path: &Path, config: &ProjectConfig) -> Result<()> {
    let dir = frontend_path.join("src").join("app").join("welcome");
    fs::create_dir_all(&dir).await?;

    fs::write(dir.join("welcome.component.ts"), WELCOME_COMPONENT_TS)
        .await
        .context("could not write welcome.component.ts")?;
    fs::write(
        dir.join("welcome.component.html"),
        welcome_html(&config.project_name),
    )
    .await
    .context("could not write welcome.component.html")?;
    fs::write(dir.join("welcome.component.css"), WELCOME_COMPONENT_CSS)
        .await
        .context("could not write welcome.component.css")?;
    Ok(())
}

/// Route the app shell to the welcome dashboard and provide HttpClient.
async fn write_app_shell(frontend_path: &Path) -> Result<()> {
    let app_dir = frontend_path.join("src").join("app");
    fs::create_dir_all(&app_dir).await?;

    fs::write(app_dir.join("app.component.ts"), APP_COMPONENT)
        .await
        .context("could not write app.component.ts")?;
    fs::write(app_dir.join("app.routes.ts"), APP_ROUTES)
        .await
        .context("could not write app.routes.ts")?;
    fs::write(app_dir.join("app.config.ts"), APP_CONFIG)
        .await
        .context("could not write app.config.ts")?;
    Ok(())
}

const API_SERVICE: &str = r#"import { Injectable } from '@angular/core';
import { HttpClient } from '@angular/common/http';
import { Observable } from 'rxjs';
import { environment } from '../../environments/environment';

export interface DatabaseStatus {
  success: boolean;
  message: string;
  database?: string;
  connection?: string;
  timestamp?: string;
  error?: string;
}

export interface ProjectInfo {
  success: boolean;
  project: {
    name: string;
    environment: string;
    debug: boolean;
    url: string;
    database: string;
    php_version: string;
    laravel_version: string;
  };
}

@Injectable({
  providedIn: 'root'
})
export class ApiService {
  private apiUrl = environment.apiUrl;

  constructor(private http: HttpClient) { }

  checkDatabaseConnection(): Observable<DatabaseStatus> {
    return this.http.get<DatabaseStatus>(`${this.apiUrl}/database/check`);
  }

  getProjectInfo(): Observable<ProjectInfo> {
    return this.http.get<ProjectInfo>(`${this.apiUrl}/project/info`);
  }

  healthCheck(): Observable<any> {
    return this.http.get(`${this.apiUrl}/health`);
  }
}
"#;

const WELCOME_COMPONENT_TS: &str = r#"import { Component, OnInit } from '@angular/core';
import { CommonModule } from '@angular/common';
import { ApiService, DatabaseStatus, ProjectInfo } from '../services/api.service';
import { environment } from '../../environments/environment';

@Component({
  selector: 'app-welcome',
  standalone: true,
  imports: [CommonModule],
  templateUrl: './welcome.component.html',
  styleUrls: ['./welcome.component.css']
})
export class WelcomeComponent implements OnInit {
  projectName = environment.projectName;
  databaseName = environment.database;

  databaseStatus: DatabaseStatus | null = null;
  projectInfo: ProjectInfo | null = null;

  loading = true;
  error: string | null = null;

  backendPort = '8000';
  frontendPort = '4200';

  constructor(private apiService: ApiService) { }

  ngOnInit(): void {
    this.checkBackendConnection();
  }

  checkBackendConnection(): void {
    this.loading = true;
    this.error = null;

    this.apiService.checkDatabaseConnection().subscribe({
      next: (response) => {
        this.databaseStatus = response;
        this.loadProjectInfo();
      },
      error: (err) => {
        this.error = 'Could not reach the backend. Make sure the Laravel server is running on port 8000.';
        this.loading = false;
        console.error('Error:', err);
      }
    });
  }

  loadProjectInfo(): void {
    this.apiService.getProjectInfo().subscribe({
      next: (response) => {
        this.projectInfo = response;
        this.loading = false;
      },
      error: (err) => {
        console.error('Error loading project info:', err);
        this.loading = false;
      }
    });
  }

  retry(): void {
    this.checkBackendConnection();
  }
}
"#;

fn welcome_html(project_name: &str) -> String {
    format!(
        r#"<div class="welcome-container">
  <div class="header">
    <h1>{project_name}</h1>
    <p class="subtitle">Your full-stack application is ready</p>
  </div>

  <div class="loading" *ngIf="loading">
    <div class="spinner"></div>
    <p>Connecting to the backend...</p>
  </div>

  <div class="error-message" *ngIf="error && !loading">
    <h3>Connection error</h3>
    <p>{{{{ error }}}}</p>
    <button class="retry-btn" (click)="retry()">Retry</button>
  </div>

  <div class="success-content" *ngIf="!loading && !error">
    <div class="info-grid">
      <div class="info-card">
        <h3>Project</h3>
        <p class="card-value">{{{{ projectName }}}}</p>
      </div>

      <div class="info-card" [class.success]="databaseStatus?.success">
        <h3>Database</h3>
        <p class="card-value">{{{{ databaseStatus?.database || databaseName }}}}</p>
        <span class="status-badge" *ngIf="databaseStatus?.success">Connected</span>
        <span class="status-badge error" *ngIf="!databaseStatus?.success">Error</span>
      </div>

      <div class="info-card">
        <h3>Backend (Laravel)</h3>
        <p class="card-value">Port {{{{ backendPort }}}}</p>
        <a href="http://localhost:{{{{ backendPort }}}}/api/health" target="_blank" class="link">View API</a>
      </div>

      <div class="info-card">
        <h3>Frontend (Angular)</h3>
        <p class="card-value">Port {{{{ frontendPort }}}}</p>
        <span class="status-badge success">Active</span>
      </div>
    </div>

    <div class="project-details" *ngIf="projectInfo">
      <h3>System details</h3>
      <div class="details-grid">
        <div class="detail-item">
          <span class="label">Laravel:</span>
          <span class="value">{{{{ projectInfo.project.laravel_version }}}}</span>
        </div>
        <div class="detail-item">
          <span class="label">PHP:</span>
          <span class="value">{{{{ projectInfo.project.php_version }}}}</span>
        </div>
        <div class="detail-item">
          <span class="label">Environment:</span>
          <span class="value">{{{{ projectInfo.project.environment }}}}</span>
        </div>
        <div class="detail-item">
          <span class="label">Status:</span>
          <span class="value success-text">Operational</span>
        </div>
      </div>
    </div>

    <div class="next-steps">
      <h3>Next steps</h3>
      <ol>
        <li>Explore the project structure in your editor</li>
        <li>Review the API routes in <code>routes/api.php</code></li>
        <li>Create your models and controllers in Laravel</li>
        <li>Build your components in Angular</li>
      </ol>
    </div>
  </div>

  <footer class="footer">
    <p>Generated by stackgen</p>
  </footer>
</div>
"#
    )
}

const WELCOME_COMPONENT_CSS: &str = r#".welcome-container {
  min-height: 100vh;
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
  padding: 40px 20px;
  font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
}

.header {
  text-align: center;
  color: white;
  margin-bottom: 40px;
}

.header h1 {
  font-size: 3em;
  margin: 0;
  text-shadow: 2px 2px 4px rgba(0,0,0,0.2);
}

.subtitle {
  font-size: 1.3em;
  margin-top: 10px;
  opacity: 0.9;
}

.loading {
  text-align: center;
  color: white;
  padding: 60px 20px;
}

.spinner {
  border: 4px solid rgba(255,255,255,0.3);
  border-top: 4px solid white;
  border-radius: 50%;
  width: 50px;
  height: 50px;
  animation: spin 1s linear infinite;
  margin: 0 auto 20px;
}

@keyframes spin {
  0% { transform: rotate(0deg); }
  100% { transform: rotate(360deg); }
}

.error-message {
  background: white;
  border-radius: 15px;
  padding: 40px;
  max-width: 600px;
  margin: 0 auto;
  text-align: center;
  box-shadow: 0 10px 30px rgba(0,0,0,0.3);
}

.retry-btn {
  background: #667eea;
  color: white;
  border: none;
  padding: 12px 30px;
  border-radius: 25px;
  font-size: 1em;
  cursor: pointer;
  margin-top: 20px;
}

.retry-btn:hover {
  background: #764ba2;
}

.success-content {
  max-width: 1200px;
  margin: 0 auto;
}

.info-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(250px, 1fr));
  gap: 20px;
  margin-bottom: 40px;
}

.info-card {
  background: white;
  border-radius: 15px;
  padding: 30px;
  text-align: center;
  box-shadow: 0 10px 30px rgba(0,0,0,0.2);
}

.info-card h3 {
  color: #333;
  margin: 10px 0;
  font-size: 1.2em;
}

.card-value {
  color: #667eea;
  font-size: 1.3em;
  font-weight: bold;
  margin: 10px 0;
}

.status-badge {
  display: inline-block;
  padding: 5px 15px;
  border-radius: 20px;
  font-size: 0.9em;
  margin-top: 10px;
  background: #4CAF50;
  color: white;
}

.status-badge.error {
  background: #f44336;
}

.link {
  color: #667eea;
  text-decoration: none;
  font-size: 0.9em;
  display: inline-block;
  margin-top: 10px;
}

.project-details,
.next-steps {
  background: white;
  border-radius: 15px;
  padding: 30px;
  margin-bottom: 30px;
  box-shadow: 0 10px 30px rgba(0,0,0,0.2);
}

.details-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 15px;
}

.detail-item {
  display: flex;
  justify-content: space-between;
  padding: 10px;
  background: #f5f5f5;
  border-radius: 8px;
}

.detail-item .label {
  font-weight: bold;
  color: #666;
}

.success-text {
  color: #4CAF50;
}

.next-steps ol {
  line-height: 2;
  color: #555;
}

.next-steps code {
  background: #f5f5f5;
  padding: 2px 8px;
  border-radius: 4px;
  color: #667eea;
  font-family: 'Courier New', monospace;
}

.footer {
  text-align: center;
  color: white;
  margin-top: 40px;
  opacity: 0.8;
}
"#;

const APP_COMPONENT: &str = r#"import { Component } from '@angular/core';
import { RouterOutlet } from '@angular/router';

@Component({
  selector: 'app-root',
  standalone: true,
  imports: [RouterOutlet],
  template: '<router-outlet></router-outlet>',
  styles: []
})
export class AppComponent {
  title = 'stackgen-app';
}
"#;

const APP_ROUTES: &str = r#"import { Routes } from '@angular/router';
import { WelcomeComponent } from './welcome/welcome.component';

export const routes: Routes = [
  { path: '', component: WelcomeComponent },
  { path: '**', redirectTo: '' }
];
"#;

const APP_CONFIG: &str = r#"import { ApplicationConfig, provideZoneChangeDetection } from '@angular/core';
import { provideRouter } from '@angular/router';
import { provideHttpClient } from '@angular/common/http';

import { routes } from './app.routes';

export const appConfig: ApplicationConfig = {
  providers: [
    provideZoneChangeDetection({ eventCoalescing: true }),
    provideRouter(routes),
    provideHttpClient()
  ]
};
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, ProjectConfig};

    fn sample_config() -> ProjectConfig {
        ProjectConfig {
            project_name: "shop-front".to_string(),
            database: DatabaseConfig {
                host: "localhost".to_string(),
                user: "root".to_string(),
                password: String::new(),
                name: "shop_front_db".to_string(),
            },
        }
    }

    #[test]
    fn environment_template_carries_project_identity() {
        let dev = environment_template(false, &sample_config());
        assert!(dev.contains("production: false"));
        assert!(dev.contains("projectName: 'shop-front'"));
        assert!(dev.contains("database: 'shop_front_db'"));

        let prod = environment_template(true, &sample_config());
        assert!(prod.contains("production: true"));
    }

    #[test]
    fn welcome_html_renders_angular_bindings_untouched() {
        let html = welcome_html("shop-front");
        assert!(html.contains("<h1>shop-front</h1>"));
        // Angular interpolation must survive the Rust formatting pass.
        assert!(html.contains("{{ projectName }}"));
        assert!(html.contains("{{ backendPort }}"));
    }
}
