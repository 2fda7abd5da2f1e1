use crate::enums::TransformPolicy;

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transform matrix is not invertible")]
    Singular,
}

/// A 3D affine map stored as a 4×4 homogeneous matrix acting on column vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix4<f64>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    pub fn from_linear_and_translation(linear: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    /// Rotation of the y-z plane by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_matrix(Matrix4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Rotation of the x-z plane by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_matrix(Matrix4::new(
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Rotation of the x-y plane by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_matrix(Matrix4::new(
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    pub fn uniform_scale(factor: f64) -> Self {
        Self::from_matrix(Matrix4::new(
            factor, 0.0, 0.0, 0.0, //
            0.0, factor, 0.0, 0.0, //
            0.0, 0.0, factor, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    pub fn translation(offset: Vector3<f64>) -> Self {
        Self::from_matrix(Matrix4::new_translation(&offset))
    }

    /// Build from the 12 affine parameters: the 3×3 linear part row by row,
    /// then the translation.
    pub fn from_parameters(parameters: [f64; 12]) -> Self {
        let linear = Matrix3::from_row_slice(&parameters[..9]);
        let translation = Vector3::new(parameters[9], parameters[10], parameters[11]);
        Self::from_linear_and_translation(linear, translation)
    }

    pub fn parameters(&self) -> [f64; 12] {
        let mut parameters = [0.0; 12];
        for i in 0..3 {
            for j in 0..3 {
                parameters[i * 3 + j] = self.matrix[(i, j)];
            }
            parameters[9 + i] = self.matrix[(i, 3)];
        }
        parameters
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn offset(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// The same map pivoting around `center` instead of the physical origin.
    pub fn centered(&self, center: &Point3<f64>) -> Self {
        let to_center = Matrix4::new_translation(&center.coords);
        let from_center = Matrix4::new_translation(&-center.coords);
        Self::from_matrix(to_center * self.matrix * from_center)
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &AffineTransform) -> Self {
        Self::from_matrix(next.matrix * self.matrix)
    }

    pub fn inverse(&self) -> Result<Self, TransformError> {
        self.matrix
            .try_inverse()
            .map(Self::from_matrix)
            .ok_or(TransformError::Singular)
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(point)
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.matrix.is_identity(epsilon)
    }
}

/// Which scalar argument a pipeline step came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformKind {
    RotationX,
    RotationY,
    RotationZ,
    Scale,
    Translation,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::RotationX => "x-rotation",
            TransformKind::RotationY => "y-rotation",
            TransformKind::RotationZ => "z-rotation",
            TransformKind::Scale => "scale",
            TransformKind::Translation => "translation",
        };
        f.write_str(name)
    }
}

/// Scalar transform arguments. The default requests no transform at all.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParams {
    /// Rotation angles in radians about x, y and z.
    pub rotation: Vector3<f64>,
    pub scale: f64,
    pub translation: Vector3<f64>,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotation: Vector3::zeros(),
            scale: 1.0,
            translation: Vector3::zeros(),
        }
    }
}

impl TransformParams {
    /// Centered transforms for every non-default parameter, in application order.
    pub fn steps(&self, center: &Point3<f64>) -> Vec<(TransformKind, AffineTransform)> {
        let mut steps = Vec::new();
        if self.rotation.x != 0.0 {
            steps.push((
                TransformKind::RotationX,
                AffineTransform::rotation_x(self.rotation.x).centered(center),
            ));
        }
        if self.rotation.y != 0.0 {
            steps.push((
                TransformKind::RotationY,
                AffineTransform::rotation_y(self.rotation.y).centered(center),
            ));
        }
        if self.rotation.z != 0.0 {
            steps.push((
                TransformKind::RotationZ,
                AffineTransform::rotation_z(self.rotation.z).centered(center),
            ));
        }
        if self.scale != 1.0 {
            steps.push((
                TransformKind::Scale,
                AffineTransform::uniform_scale(self.scale).centered(center),
            ));
        }
        if self.translation.iter().any(|&t| t != 0.0) {
            steps.push((
                TransformKind::Translation,
                AffineTransform::translation(self.translation),
            ));
        }
        steps
    }
}

/// Ordered transform steps plus the rule deciding how they reach the resampler.
#[derive(Clone, Debug, Default)]
pub struct TransformPipeline {
    pub steps: Vec<(TransformKind, AffineTransform)>,
    pub policy: TransformPolicy,
}

impl TransformPipeline {
    pub fn new(policy: TransformPolicy) -> Self {
        Self {
            steps: Vec::new(),
            policy,
        }
    }

    pub fn from_params(
        params: &TransformParams,
        center: &Point3<f64>,
        policy: TransformPolicy,
    ) -> Self {
        Self {
            steps: params.steps(center),
            policy,
        }
    }

    pub fn push(&mut self, kind: TransformKind, transform: AffineTransform) {
        self.steps.push((kind, transform));
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps multiplied together, first step applied first.
    pub fn composed(&self) -> AffineTransform {
        self.steps
            .iter()
            .fold(AffineTransform::identity(), |acc, (_, step)| acc.then(step))
    }

    /// The transforms handed to the resampler, one per pass.
    pub fn passes(&self) -> Vec<(Option<TransformKind>, AffineTransform)> {
        if self.steps.is_empty() {
            return Vec::new();
        }
        match self.policy {
            TransformPolicy::Compose => vec![(None, self.composed())],
            TransformPolicy::Sequential => self
                .steps
                .iter()
                .map(|(kind, step)| (Some(*kind), *step))
                .collect(),
            TransformPolicy::LastWins => self
                .steps
                .last()
                .map(|(kind, step)| (Some(*kind), *step))
                .into_iter()
                .collect(),
        }
    }
}
