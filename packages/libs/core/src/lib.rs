//! tkt-core: ticketkit 공통 핵심 라이브러리
//!
//! 학교 IT 지원 티켓 시스템의 세션/접근제어 핵심 타입과 로직을 제공합니다.
//! I/O를 수행하지 않는 순수 로직만 담으며, 저장소/HTTP 계층은 tkt-api가
//! 담당합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: Access Token 발급/검증, Refresh Token 생성/다이제스트, 비밀번호 해시
//! - `permissions`: Role/소유권 검사 및 티켓 조회 범위 결정
//! - `principal`: 계정(Principal)과 Role 타입
//! - `ticket`: 티켓 도메인 타입
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod error;
pub mod permissions;
pub mod principal;
pub mod ticket;

pub use error::{Error, Result};
