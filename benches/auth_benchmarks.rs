use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use chrono::Duration;
use grovekeeper::auth::models::{Gender, NewUser, Role, SignupRequest};
use grovekeeper::auth::validation::{is_valid_email, validate_signup};
use grovekeeper::auth::{PasswordHasher, TokenKind, TokenService, TokenSigner};

fn token_service() -> TokenService {
    TokenService::new(
        TokenSigner::new("bench-access-secret", Duration::minutes(15)),
        TokenSigner::new("bench-refresh-secret", Duration::days(7)),
    )
}

fn bench_tokens(c: &mut Criterion) {
    let service = token_service();
    let user = NewUser {
        name: "Bench User".to_string(),
        email: "bench@example.com".to_string(),
        password_hash: String::new(),
        role: Role::User,
        site_id: None,
        gender: Gender::Other,
        designation: None,
    }
    .into_user();

    c.bench_function("token_issue_pair", |b| {
        b.iter(|| service.issue_pair(black_box(&user)))
    });

    let token = service.issue(TokenKind::Access, &user).unwrap();
    c.bench_function("token_verify", |b| {
        b.iter(|| service.verify(TokenKind::Access, black_box(&token)))
    });
}

fn bench_passwords(c: &mut Criterion) {
    let mut group = c.benchmark_group("bcrypt");
    group.sample_size(10);

    for cost in [4, 10] {
        let hasher = PasswordHasher::new(cost);
        let hash = hasher.hash("benchmark-password").unwrap();

        group.bench_function(format!("hash_cost_{cost}"), |b| {
            b.iter(|| hasher.hash(black_box("benchmark-password")))
        });
        group.bench_function(format!("verify_cost_{cost}"), |b| {
            b.iter(|| hasher.verify(black_box("benchmark-password"), black_box(&hash)))
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    c.bench_function("email_check", |b| {
        b.iter(|| is_valid_email(black_box("first.last+tag@sub.example.org")))
    });

    c.bench_function("validate_signup", |b| {
        b.iter(|| {
            validate_signup(black_box(SignupRequest {
                name: "Bench User".to_string(),
                email: "Bench@Example.com".to_string(),
                password: "benchmark".to_string(),
                site_id: None,
                gender: Some("female".to_string()),
                designation: None,
            }))
        })
    });
}

criterion_group!(benches, bench_tokens, bench_passwords, bench_validation);
criterion_main!(benches);
